//! crates/course_enrollment_core/src/services/user_service.rs
//!
//! User lifecycle: registration, lookup, profile updates and deletion.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewUser, User, UserEnrollment, UserUpdate};
use crate::error::{DomainError, DomainResult};
use crate::locks::AggregateLocks;
use crate::ports::{PasswordHasher, UserRepository};
use crate::retry::RetryPolicy;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    retry: RetryPolicy,
    locks: AggregateLocks,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            retry,
            locks: AggregateLocks::new(),
        }
    }

    //=====================================================================================
    // Lifecycle
    //=====================================================================================

    /// Registers a new user. Emails are matched case-sensitively.
    pub async fn create_user(&self, new_user: NewUser) -> DomainResult<User> {
        validate_name(&new_user.name)?;
        validate_email(&new_user.email)?;
        if new_user.password.is_empty() {
            return Err(DomainError::Validation("password must not be empty".to_string()));
        }

        if self.find_by_email(&new_user.email).await?.is_some() {
            return Err(email_taken(&new_user.email));
        }

        let password_hash = self.hasher.hash(&new_user.password)?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: new_user.name,
            email: new_user.email,
            password_hash,
            enrollments: Vec::new(),
            created_at: Utc::now(),
        };

        // Inserts reserve an id and an email, so they are never retried.
        let user = self.users.insert_user(user).await?;
        info!("Created user {}", user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> DomainResult<User> {
        self.retry
            .run("get_user", move || self.users.get_user(id))
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    pub async fn list_users(&self) -> DomainResult<Vec<User>> {
        Ok(self
            .retry
            .run("list_users", move || self.users.list_users())
            .await?)
    }

    /// Used by authentication; absence is not an error here.
    pub async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        Ok(self
            .retry
            .run("find_user_by_email", move || self.users.find_user_by_email(email))
            .await?)
    }

    pub async fn exists(&self, id: &str) -> DomainResult<bool> {
        Ok(self
            .retry
            .run("get_user", move || self.users.get_user(id))
            .await?
            .is_some())
    }

    /// Merges the supplied fields over the stored user.
    pub async fn update_user(&self, id: &str, update: UserUpdate) -> DomainResult<User> {
        let _guard = self.locks.acquire(id).await;
        let mut user = self.get_user(id).await?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            user.name = name;
        }
        if let Some(email) = update.email {
            validate_email(&email)?;
            if email != user.email {
                if let Some(other) = self.find_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(email_taken(&email));
                    }
                }
                user.email = email;
            }
        }
        if let Some(password) = update.password {
            if password.is_empty() {
                return Err(DomainError::Validation("password must not be empty".to_string()));
            }
            user.password_hash = self.hasher.hash(&password)?;
        }

        self.store(&user).await?;
        info!("Updated user {}", user.id);
        Ok(user)
    }

    /// Removes the user and returns the deleted record. Enrollment and
    /// progress entries in courses are left in place.
    pub async fn delete_user(&self, id: &str) -> DomainResult<User> {
        let _guard = self.locks.acquire(id).await;
        let user = self.get_user(id).await?;

        let deleted = self
            .retry
            .run("delete_user", move || self.users.delete_user(id))
            .await?;
        if !deleted {
            return Err(DomainError::not_found("User", id));
        }

        info!("Deleted user {}", id);
        Ok(user)
    }

    /// Mirrors a course enrollment on the user record. Returns `false` when
    /// the user does not exist, which callers tolerate.
    pub async fn record_enrollment(
        &self,
        user_id: &str,
        course_id: &str,
        enrolled_at: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let _guard = self.locks.acquire(user_id).await;
        let Some(mut user) = self
            .retry
            .run("get_user", move || self.users.get_user(user_id))
            .await?
        else {
            warn!("Enrollment of unknown user {} in course {}", user_id, course_id);
            return Ok(false);
        };

        if user.enrollments.iter().any(|e| e.course_id == course_id) {
            return Ok(true);
        }
        user.enrollments.push(UserEnrollment {
            course_id: course_id.to_string(),
            enrolled_at,
        });
        self.store(&user).await?;
        Ok(true)
    }

    /// Ids whose user lock is currently held or awaited.
    #[cfg(test)]
    pub(crate) fn held_locks(&self) -> usize {
        self.locks.len()
    }

    async fn store(&self, user: &User) -> DomainResult<()> {
        self.retry
            .run("save_user", move || self.users.save_user(user))
            .await?;
        Ok(())
    }
}

fn email_taken(email: &str) -> DomainError {
    DomainError::Conflict(format!("Email {} is already registered", email))
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if !EMAIL_RE.is_match(email) {
        return Err(DomainError::Validation(format!("'{}' is not a valid email", email)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::services::test_support::PlainHasher;

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(PlainHasher),
            RetryPolicy::none(),
        )
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_string(),
            email: email.to_string(),
            password: "secret".to_string(),
        }
    }

    #[test]
    fn test_email_syntax() {
        for ok in ["a@b.co", "first.last@mail.example.org"] {
            assert!(validate_email(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "plain", "a@b", "a b@c.d", "a@@b.c", "@b.co"] {
            assert!(matches!(validate_email(bad), Err(DomainError::Validation(_))), "{}", bad);
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let svc = service();
        let user = svc.create_user(new_user("ada@example.com")).await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password_hash, "secret");
        assert!(user.enrollments.is_empty());
        assert_eq!(svc.get_user(&user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_without_persisting() {
        let svc = service();
        svc.create_user(new_user("ada@example.com")).await.unwrap();

        let err = svc.create_user(new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(svc.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_email_match_is_case_sensitive() {
        let svc = service();
        svc.create_user(new_user("ada@example.com")).await.unwrap();
        assert!(svc.create_user(new_user("Ada@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_input_is_a_validation_error() {
        let svc = service();
        let err = svc.create_user(new_user("not-an-email")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let mut blank = new_user("b@example.com");
        blank.name = "  ".to_string();
        assert!(matches!(
            svc.create_user(blank).await.unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let svc = service();
        let user = svc.create_user(new_user("ada@example.com")).await.unwrap();

        let updated = svc
            .update_user(
                &user.id,
                UserUpdate {
                    name: Some("Ada Lovelace".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Ada Lovelace");
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.password_hash, user.password_hash);
    }

    #[tokio::test]
    async fn test_update_to_taken_email_conflicts() {
        let svc = service();
        svc.create_user(new_user("ada@example.com")).await.unwrap();
        let bob = svc.create_user(new_user("bob@example.com")).await.unwrap();

        let err = svc
            .update_user(
                &bob.id,
                UserUpdate {
                    email: Some("ada@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let svc = service();
        let err = svc.update_user("nope", UserUpdate::default()).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_removes_user() {
        let svc = service();
        let user = svc.create_user(new_user("ada@example.com")).await.unwrap();

        let deleted = svc.delete_user(&user.id).await.unwrap();
        assert_eq!(deleted.id, user.id);
        assert!(matches!(
            svc.get_user(&user.id).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
        assert!(matches!(
            svc.delete_user(&user.id).await.unwrap_err(),
            DomainError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_find_by_email_returns_none_when_absent() {
        let svc = service();
        assert!(svc.find_by_email("ghost@example.com").await.unwrap().is_none());
    }
}
