//! Error types for the caching core
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for caches, resources and the inspection API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Named cache or resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Value could not be encoded or decoded by the configured transform
    #[error("Transform failed: {0}")]
    Transform(String),

    /// A cleanup task returned an error or panicked
    #[error("Cleanup task '{task}' failed: {reason}")]
    CleanupFailed { task: String, reason: String },
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Transform(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            CacheError::Transform(_) | CacheError::CleanupFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
