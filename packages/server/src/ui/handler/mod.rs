//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::{create_lobby, delete_lobby, fetch_lobby, health_check, update_lobby};
pub use websocket::websocket_handler;
