//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use slg_common::Error;
use tracing::error;

/// Errors surfaced to HTTP clients as `{"error": message}`
#[derive(Debug)]
pub enum ApiError {
    /// Name or id did not resolve
    NotFound(String),
    /// Malformed snapshot or request
    BadRequest(String),
    /// Operation not valid in the game's current state
    Conflict(String),
    /// Optional capability (reranker) not available
    Unavailable(String),
    Internal(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::UnknownIdentifier { .. } | Error::UnknownSong(_) => ApiError::NotFound(err.to_string()),
            Error::InvalidSnapshot(_) => ApiError::BadRequest(err.to_string()),
            Error::InvalidState(_) => ApiError::Conflict(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
