use crate::services::artifact::ArtifactError;
use crate::services::extraction::ExtractionError;
use crate::utils::validation::{CONTENT_MISMATCH, FILE_TOO_LARGE, INVALID_MIME_TYPE, ValidationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),

    /// 500 whose message is safe to show the client as is
    #[error("{0}")]
    Failure(String),

    #[error("Payload Too Large: {0}")]
    PayloadTooLarge(String),

    #[error("Service Unavailable: {0}")]
    Unavailable(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, debug) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, None),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            AppError::Failure(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg, None),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg, None),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            AppError::Validation(e) => {
                let status = match e.code {
                    FILE_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                    INVALID_MIME_TYPE | CONTENT_MISMATCH => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, e.message, None)
            }
            AppError::Extraction(e) => match e {
                ExtractionError::Persistence(err) => {
                    tracing::error!("GST extraction error: {}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                        None,
                    )
                }
                ExtractionError::Spawn { .. }
                | ExtractionError::Wait(_)
                | ExtractionError::ExitFailure { .. } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process files".to_string(),
                    None,
                ),
                ExtractionError::Timeout(_) => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Extraction timed out".to_string(),
                    None,
                ),
                ExtractionError::Parse { diagnostics } => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to parse extraction output".to_string(),
                    diagnostics,
                ),
                ExtractionError::Publish(ArtifactError::Busy(_)) => (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Excel file is being updated, try again".to_string(),
                    None,
                ),
                ExtractionError::Publish(ArtifactError::Io(_)) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process files".to_string(),
                    None,
                ),
            },
            AppError::Anyhow(e) => {
                tracing::error!("Anyhow error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = match debug {
            Some(debug) => json!({ "error": message, "debug": debug }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}
