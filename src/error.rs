use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::StorageError;

/// Errors surfaced to API clients. Messages double as the inline text shown
/// next to the form, so keep them user-readable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Seed must be a numeric value")]
    InvalidSeed,
    #[error("A generation is already in progress")]
    GenerationInFlight,
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
    #[error("Generation not found: {0}")]
    UnknownGeneration(Uuid),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidSeed => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::GenerationInFlight => StatusCode::CONFLICT,
            ApiError::UnknownPreset(_) | ApiError::UnknownGeneration(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
