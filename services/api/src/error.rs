//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and its mapping
//! onto HTTP responses.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use course_enrollment_core::DomainError;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error raised by one of the domain services.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a failure to run the embedded database migrations.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents an error from the Redis client.
    #[error("Redis Error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was malformed before it reached a domain service.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Domain(e) => domain_status(e),
            ApiError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            other => {
                error!("Internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

/// Client-facing status and message. Internal and storage details are only logged.
fn domain_status(e: DomainError) -> (StatusCode, String) {
    match e {
        DomainError::NotFound(msg) => {
            info!("Resource not found: {}", msg);
            (StatusCode::NOT_FOUND, msg)
        }
        DomainError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        DomainError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        DomainError::Auth(msg) => {
            warn!("Authentication failed: {}", msg);
            (StatusCode::UNAUTHORIZED, msg)
        }
        DomainError::Unavailable(msg) => {
            error!("Backing store unavailable: {}", msg);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable".to_string(),
            )
        }
        DomainError::Internal(msg) => {
            error!("Internal error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
