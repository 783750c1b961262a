//! Domain errors

use thiserror::Error;

use super::{entity::LifecycleState, value_object::ValueObjectError};

/// Errors raised by a `SharedLobbyStore` implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Document '{0}' not found")]
    NotFound(String),

    #[error("Document '{0}' already exists")]
    AlreadyExists(String),

    /// A field precondition did not hold; nothing was written
    #[error("Precondition failed on field '{0}'")]
    PreconditionFailed(String),

    /// Transient infrastructure failure; the write may be retried
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store returned data that is not a lobby document
    #[error("Malformed document: {0}")]
    Malformed(String),
}

/// Errors raised while handing a finished match to the rating consumer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Match result consumer is gone")]
    ConsumerClosed,

    #[error("Failed to publish match result: {0}")]
    Rejected(String),
}

/// Lobby coordination errors surfaced to callers.
///
/// `ConcurrencyLost` and `StoreUnavailable` have already been retried by the
/// coordinator when they reach the caller; everything else is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("Lobby '{0}' not found")]
    LobbyNotFound(String),

    #[error("Room is full ({occupied}/{capacity})")]
    LobbyFull { occupied: usize, capacity: usize },

    #[error("Player '{actor}' is not allowed to {action}")]
    Unauthorized { actor: String, action: &'static str },

    #[error("Cannot {action} while lobby is {state}: {detail}")]
    IllegalTransition {
        action: &'static str,
        state: LifecycleState,
        detail: String,
    },

    #[error("Lost the race to {operation} after {attempts} attempts")]
    ConcurrencyLost {
        operation: &'static str,
        attempts: u32,
    },

    #[error("Lobby store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Lobby document is corrupt: {0}")]
    CorruptSnapshot(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LobbyError {
    /// Whether a later attempt may succeed without the caller changing anything
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LobbyError::ConcurrencyLost { .. } | LobbyError::StoreUnavailable(_)
        )
    }
}

impl From<ValueObjectError> for LobbyError {
    fn from(error: ValueObjectError) -> Self {
        LobbyError::InvalidRequest(error.to_string())
    }
}
