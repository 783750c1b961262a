//! CLI lobby client for Courtlobby.
//!
//! Runs the lobby coordinator locally against a `courtlobby-server` store
//! service: `HttpLobbyStore` implements the shared store contract over HTTP
//! and WebSocket, and the session runner keeps a live view of one lobby.

pub mod command;
pub mod error;
pub mod formatter;
pub mod runner;
pub mod session;
pub mod store;
