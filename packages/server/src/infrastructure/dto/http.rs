//! HTTP API request/response DTOs for the lobby document service.

use serde::{Deserialize, Serialize};

use crate::domain::StoreError;

/// `GET /api/health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub conditional_writes: bool,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    PreconditionFailed,
    Unavailable,
    Malformed,
}

impl From<&StoreError> for ErrorResponse {
    fn from(error: &StoreError) -> Self {
        let kind = match error {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            StoreError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            StoreError::Unavailable(_) => ErrorKind::Unavailable,
            StoreError::Malformed(_) => ErrorKind::Malformed,
        };
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

impl ErrorResponse {
    /// Rebuild the store error on the client side.
    ///
    /// `subject` is the room code or field path the request was about.
    pub fn into_store_error(self, subject: &str) -> StoreError {
        match self.kind {
            ErrorKind::NotFound => StoreError::NotFound(subject.to_string()),
            ErrorKind::AlreadyExists => StoreError::AlreadyExists(subject.to_string()),
            ErrorKind::PreconditionFailed => StoreError::PreconditionFailed(self.message),
            ErrorKind::Unavailable => StoreError::Unavailable(self.message),
            ErrorKind::Malformed => StoreError::Malformed(self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_wire_format() {
        // テスト項目: エラーレスポンスは snake_case の kind とメッセージを持つ
        // given (前提条件):
        let error = StoreError::PreconditionFailed("teams.team1.slot2".to_string());

        // when (操作):
        let json = serde_json::to_value(ErrorResponse::from(&error)).unwrap();

        // then (期待する結果):
        assert_eq!(json["kind"], "precondition_failed");
        assert_eq!(
            json["message"],
            "Precondition failed on field 'teams.team1.slot2'"
        );
    }

    #[test]
    fn test_not_found_round_trips_to_store_error() {
        // テスト項目: クライアント側で NotFound を元のストアエラーに戻せる
        // given (前提条件):
        let response = ErrorResponse::from(&StoreError::NotFound("ABCD12".to_string()));

        // when (操作):
        let error = response.into_store_error("ABCD12");

        // then (期待する結果):
        assert_eq!(error, StoreError::NotFound("ABCD12".to_string()));
    }
}
