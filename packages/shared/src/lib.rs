//! Utilities shared by the Courtlobby server and client crates.

pub mod logger;
pub mod time;
