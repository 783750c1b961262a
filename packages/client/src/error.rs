//! Error types for the lobby client.

use courtlobby_server::domain::LobbyError;
use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The store service could not be reached or dropped the connection
    #[error("Connection error: {0}")]
    Connection(String),

    /// A command-line argument could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

impl ClientError {
    /// Worth reconnecting and trying again
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Connection(_) => true,
            ClientError::Lobby(e) => e.is_retryable(),
            ClientError::InvalidArgument(_) => false,
        }
    }
}
