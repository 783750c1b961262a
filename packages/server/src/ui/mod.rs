//! Lobby document service (axum).
//!
//! `InMemoryLobbyStore` を HTTP と WebSocket で公開し、複数のクライアントが
//! 同じロビー文書を共有できるようにします。

mod handler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
