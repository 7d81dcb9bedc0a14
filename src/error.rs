//! Error types for the highlighter server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dom::DomError;
use crate::highlight::SplitError;
use crate::html::SanitizeError;
use crate::store::StoreError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Highlight error: {0}")]
    Split(#[from] SplitError),

    #[error("Sanitize error: {0}")]
    Sanitize(#[from] SanitizeError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Store(e) => match e {
                StoreError::InvalidData(_) => (
                    StatusCode::BAD_REQUEST,
                    "invalid_data",
                    "invalid data".to_string(),
                ),
                StoreError::UnknownColor(color) => (
                    StatusCode::BAD_REQUEST,
                    "unknown_color",
                    format!("Color is not in the palette: {}", color),
                ),
                _ => {
                    tracing::error!("Store error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "store_error",
                        "Store error".to_string(),
                    )
                }
            },
            AppError::Dom(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "document_error",
                e.to_string(),
            ),
            AppError::Split(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "selection_error",
                e.to_string(),
            ),
            AppError::Sanitize(e) => {
                tracing::warn!("Sanitize error: {}", e);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "parse_error",
                    "Failed to process page markup".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
