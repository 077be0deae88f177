//! crates/course_enrollment_core/src/error.rs
//!
//! The typed error returned by every domain service operation.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule was violated (email, enrollment, unit or class id).
    #[error("{0}")]
    Conflict(String),

    /// Malformed or referentially invalid input.
    #[error("{0}")]
    Validation(String),

    /// Bad credentials or an invalid token.
    #[error("{0}")]
    Auth(String),

    /// The backing store stayed unreachable after all retries.
    #[error("Service temporarily unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{} {} not found", entity, id))
    }
}

impl From<PortError> for DomainError {
    fn from(e: PortError) -> Self {
        match e {
            PortError::NotFound(msg) => DomainError::NotFound(msg),
            PortError::Conflict(msg) => DomainError::Conflict(msg),
            PortError::Unavailable(msg) => DomainError::Unavailable(msg),
            PortError::Unexpected(msg) => DomainError::Internal(msg),
            PortError::Unauthorized => DomainError::Auth("invalid credentials".to_string()),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
