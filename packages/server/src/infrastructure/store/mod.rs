//! SharedLobbyStore の実装
//!
//! - `inmemory`: プロセス内の HashMap + watch チャネルによる実装
//!   （ストアサービスのバックエンドと統合テストで使用）
//! - HTTP 越しの実装はクライアントクレート（`HttpLobbyStore`）が提供します

pub mod inmemory;

pub use inmemory::InMemoryLobbyStore;
