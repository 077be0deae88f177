//! crates/course_enrollment_core/src/services/auth_service.rs
//!
//! Login and registration on top of the user service. Token format and
//! password hashing live behind the `TokenIssuer` and `PasswordHasher` ports.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{NewUser, TokenClaims, User};
use crate::error::{DomainError, DomainResult};
use crate::ports::{PasswordHasher, TokenIssuer};
use crate::services::UserService;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// The outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    pub access_token: String,
}

pub struct AuthService {
    users: Arc<UserService>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<UserService>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Returns a fresh access token. Unknown emails and wrong passwords fail
    /// with the same error.
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<String> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Login attempt for unknown email");
            return Err(DomainError::Auth(INVALID_CREDENTIALS.to_string()));
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!("Login attempt with wrong password for user {}", user.id);
            return Err(DomainError::Auth(INVALID_CREDENTIALS.to_string()));
        }

        info!("User {} logged in", user.id);
        Ok(self.tokens.issue(&user.id, &user.email)?)
    }

    pub async fn register(&self, new_user: NewUser) -> DomainResult<Registration> {
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(DomainError::Conflict(format!(
                "Email {} is already registered",
                new_user.email
            )));
        }
        let user = self.users.create_user(new_user).await?;
        let access_token = self.tokens.issue(&user.id, &user.email)?;
        Ok(Registration { user, access_token })
    }

    pub fn verify_token(&self, token: &str) -> DomainResult<TokenClaims> {
        self.tokens
            .verify(token)
            .map_err(|_| DomainError::Auth("invalid or expired token".to_string()))
    }
}
