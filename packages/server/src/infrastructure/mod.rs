//! Infrastructure layer.
//!
//! ドメイン層が定義する trait（SharedLobbyStore, MatchResultPublisher）の
//! 具体的な実装と、ストア文書とドメインモデルの変換（DTO）を提供します。

pub mod dto;
pub mod publisher;
pub mod store;
