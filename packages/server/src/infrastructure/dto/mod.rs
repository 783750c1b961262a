//! Data Transfer Objects (DTOs) for the lobby store.
//!
//! - `document`: lobby document schema as stored
//! - `conversion`: document ⇔ domain model, patch → field update
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod document;
pub mod http;

pub use conversion::{decode_lobby, encode_lobby, encode_patch};
