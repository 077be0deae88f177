//! crates/course_enrollment_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage engines and crypto libraries.

use async_trait::async_trait;

use crate::domain::{Course, TokenClaims, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// Adapters classify their driver errors into these kinds; no driver type crosses the port.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A transient failure (connection loss, pool timeout, I/O). Safe to retry
    /// for idempotent calls.
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

impl PortError {
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Unavailable(_))
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Port
//=========================================================================================

/// Durable storage of Course aggregates. Every call loads or stores the whole aggregate.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Stores a new course. Fails with `Conflict` if the id is taken.
    async fn insert_course(&self, course: Course) -> PortResult<Course>;

    async fn get_course(&self, id: &str) -> PortResult<Option<Course>>;

    /// All courses, oldest first.
    async fn list_courses(&self) -> PortResult<Vec<Course>>;

    /// Replaces a stored course. Fails with `NotFound` if it does not exist.
    async fn save_course(&self, course: &Course) -> PortResult<()>;
}

/// Durable storage of User aggregates. Email uniqueness is enforced here as well
/// as in the service so that concurrent registrations cannot both succeed.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user. Fails with `Conflict` if the id or email is taken.
    async fn insert_user(&self, user: User) -> PortResult<User>;

    async fn get_user(&self, id: &str) -> PortResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;

    /// All users, oldest first.
    async fn list_users(&self) -> PortResult<Vec<User>>;

    /// Replaces a stored user. Fails with `NotFound` if absent and with
    /// `Conflict` if the new email belongs to another user.
    async fn save_user(&self, user: &User) -> PortResult<()>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_user(&self, id: &str) -> PortResult<bool>;
}

//=========================================================================================
// Credential Ports
//=========================================================================================

/// Salted one-way password hashing.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    /// `Ok(false)` means a well-formed hash that does not match.
    fn verify(&self, password: &str, hash: &str) -> PortResult<bool>;
}

/// Issues and checks signed, time-limited session tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, subject_id: &str, email: &str) -> PortResult<String>;

    fn verify(&self, token: &str) -> PortResult<TokenClaims>;
}
