//! Lobby coordination engine for shared-store multiplayer lobbies.
//!
//! Clients coordinate only through a shared lobby document store: every
//! mutation is decided against a fresh snapshot and committed with
//! conditional writes (or verified re-reads on last-write-wins stores).
//!
//! The crate also ships an in-memory store and an axum service exposing it,
//! used by the `courtlobby-server` binary.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
