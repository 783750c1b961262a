//! HTTP API endpoint handlers.
//!
//! | Method | Path                  | 成功          | 失敗                         |
//! |--------|-----------------------|---------------|------------------------------|
//! | GET    | `/api/health`         | 200           |                              |
//! | POST   | `/api/lobbies/{code}` | 201           | 409 (衝突), 400              |
//! | GET    | `/api/lobbies/{code}` | 200 (文書)    | 404                          |
//! | PATCH  | `/api/lobbies/{code}` | 204           | 404, 409 (事前条件), 400     |
//! | DELETE | `/api/lobbies/{code}` | 204           | 404                          |
//!
//! 失敗時のボディは常に `ErrorResponse` です。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    domain::{Document, FieldUpdate, RoomCode, StoreError},
    infrastructure::dto::http::{ErrorResponse, HealthResponse},
    ui::state::AppState,
};

/// Store failure rendered as an HTTP response
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists(_) | StoreError::PreconditionFailed(_) => {
                StatusCode::CONFLICT
            }
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Malformed(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(ErrorResponse::from(&self.0))).into_response()
    }
}

pub(super) fn parse_room_code(raw: String) -> Result<RoomCode, ApiError> {
    RoomCode::new(raw).map_err(|e| {
        tracing::warn!("Rejected request with invalid room code: {}", e);
        ApiError(StoreError::Malformed(e.to_string()))
    })
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        conditional_writes: state.store.capabilities().conditional_writes,
    })
}

pub async fn create_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(document): Json<Document>,
) -> Result<StatusCode, ApiError> {
    let room_code = parse_room_code(code)?;
    state.store.create_document(&room_code, document).await?;
    Ok(StatusCode::CREATED)
}

pub async fn fetch_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<Document>, ApiError> {
    let room_code = parse_room_code(code)?;
    let document = state.store.fetch_document(&room_code).await?;
    Ok(Json(document))
}

pub async fn update_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(update): Json<FieldUpdate>,
) -> Result<StatusCode, ApiError> {
    let room_code = parse_room_code(code)?;
    state.store.update_fields(&room_code, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_lobby(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room_code = parse_room_code(code)?;
    state.store.delete_document(&room_code).await?;
    tracing::info!("Lobby document {} deleted over HTTP", room_code);
    Ok(StatusCode::NO_CONTENT)
}
