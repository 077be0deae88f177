//! services/api/src/adapters/redis_store.rs
//!
//! The key-value adapter: the persistence ports on Redis.
//!
//! Layout:
//! - `course:{id}` / `user:{id}` hold the aggregate as a JSON string.
//! - `course:ids` / `user:ids` are sorted sets scored by creation time, which
//!   gives listings a stable oldest-first order.
//! - `user:email:{email}` maps an email to its user id and is claimed with
//!   `SET NX`, so two registrations of the same email cannot both succeed.

use async_trait::async_trait;
use course_enrollment_core::domain::{Course, User};
use course_enrollment_core::ports::{CourseRepository, PortError, PortResult, UserRepository};
use redis::aio::ConnectionManager;
use tracing::{debug, warn};

use super::documents::{CourseDocument, UserDocument};

const COURSE_IDS: &str = "course:ids";
const USER_IDS: &str = "user:ids";

fn course_key(id: &str) -> String {
    format!("course:{}", id)
}

fn user_key(id: &str) -> String {
    format!("user:{}", id)
}

fn email_key(email: &str) -> String {
    format!("user:email:{}", email)
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A Redis adapter that implements the persistence ports.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection. The manager reconnects on its own after
    /// connection loss.
    pub async fn connect(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    async fn get_json(&self, key: &str) -> PortResult<Option<String>> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(classify)
    }

    /// `SET key value NX|XX`; returns whether the write happened.
    async fn set_json(&self, key: &str, value: &str, condition: &str) -> PortResult<bool> {
        let mut conn = self.conn.clone();
        let reply = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg(condition)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(classify)?;
        Ok(reply.is_some())
    }

    /// Loads every member of an id index, skipping ids whose value is gone.
    async fn list_json(&self, index: &str, key_of: fn(&str) -> String) -> PortResult<Vec<String>> {
        let mut conn = self.conn.clone();
        let ids = redis::cmd("ZRANGE")
            .arg(index)
            .arg(0)
            .arg(-1)
            .query_async::<Vec<String>>(&mut conn)
            .await
            .map_err(classify)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<String> = ids.iter().map(|id| key_of(id)).collect();
        let values = redis::cmd("MGET")
            .arg(&keys)
            .query_async::<Vec<Option<String>>>(&mut conn)
            .await
            .map_err(classify)?;
        Ok(values.into_iter().flatten().collect())
    }

    async fn index(&self, index: &str, id: &str, score: i64) -> PortResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("ZADD")
            .arg(index)
            .arg(score)
            .arg(id)
            .query_async::<i64>(&mut conn)
            .await
            .map_err(classify)?;
        Ok(())
    }
}

/// Sorts client errors into the port's error kinds.
fn classify(e: redis::RedisError) -> PortError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout()
    {
        PortError::Unavailable(e.to_string())
    } else {
        PortError::Unexpected(e.to_string())
    }
}

fn decode_course(raw: &str) -> PortResult<Course> {
    serde_json::from_str::<CourseDocument>(raw)
        .map(CourseDocument::to_domain)
        .map_err(|e| PortError::Unexpected(format!("Corrupt course document: {}", e)))
}

fn decode_user(raw: &str) -> PortResult<User> {
    serde_json::from_str::<UserDocument>(raw)
        .map(UserDocument::to_domain)
        .map_err(|e| PortError::Unexpected(format!("Corrupt user document: {}", e)))
}

fn encode<T: serde::Serialize>(doc: &T) -> PortResult<String> {
    serde_json::to_string(doc).map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseRepository for RedisStore {
    async fn insert_course(&self, course: Course) -> PortResult<Course> {
        let json = encode(&CourseDocument::from(&course))?;
        if !self.set_json(&course_key(&course.id), &json, "NX").await? {
            return Err(PortError::Conflict(format!("Course {} already exists", course.id)));
        }
        if let Err(e) = self
            .index(COURSE_IDS, &course.id, course.created_at.timestamp_millis())
            .await
        {
            // An unindexed course would never be listed.
            self.discard(&course_key(&course.id)).await;
            return Err(e);
        }
        debug!("Stored course {}", course.id);
        Ok(course)
    }

    async fn get_course(&self, id: &str) -> PortResult<Option<Course>> {
        self.get_json(&course_key(id))
            .await?
            .map(|raw| decode_course(&raw))
            .transpose()
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        self.list_json(COURSE_IDS, course_key)
            .await?
            .iter()
            .map(|raw| decode_course(raw))
            .collect()
    }

    async fn save_course(&self, course: &Course) -> PortResult<()> {
        let json = encode(&CourseDocument::from(course))?;
        if !self.set_json(&course_key(&course.id), &json, "XX").await? {
            return Err(PortError::NotFound(format!("Course {} not found", course.id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for RedisStore {
    async fn insert_user(&self, user: User) -> PortResult<User> {
        // --- 1. Claim the email ---
        if !self.set_json(&email_key(&user.email), &user.id, "NX").await? {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }

        // --- 2. Store the user, releasing the email claim on failure ---
        let stored = match encode(&UserDocument::from(&user)) {
            Ok(json) => self.set_json(&user_key(&user.id), &json, "NX").await,
            Err(e) => Err(e),
        };
        match stored {
            Ok(true) => {}
            Ok(false) => {
                self.release_email(&user.email).await;
                return Err(PortError::Conflict(format!("User {} already exists", user.id)));
            }
            Err(e) => {
                self.release_email(&user.email).await;
                return Err(e);
            }
        }

        // --- 3. Index, undoing both writes on failure ---
        if let Err(e) = self
            .index(USER_IDS, &user.id, user.created_at.timestamp_millis())
            .await
        {
            self.discard(&user_key(&user.id)).await;
            self.release_email(&user.email).await;
            return Err(e);
        }
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> PortResult<Option<User>> {
        self.get_json(&user_key(id))
            .await?
            .map(|raw| decode_user(&raw))
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        match self.get_json(&email_key(email)).await? {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        self.list_json(USER_IDS, user_key)
            .await?
            .iter()
            .map(|raw| decode_user(raw))
            .collect()
    }

    async fn save_user(&self, user: &User) -> PortResult<()> {
        let existing = self
            .get_user(&user.id)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user.id)))?;

        let email_changed = existing.email != user.email;
        if email_changed && !self.set_json(&email_key(&user.email), &user.id, "NX").await? {
            let owner = self.get_json(&email_key(&user.email)).await?;
            check_claim(&user.email, owner.as_deref(), &user.id)?;
        }

        let json = encode(&UserDocument::from(user))?;
        if !self.set_json(&user_key(&user.id), &json, "XX").await? {
            return Err(PortError::NotFound(format!("User {} not found", user.id)));
        }
        if email_changed {
            self.release_email(&existing.email).await;
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> PortResult<bool> {
        let Some(existing) = self.get_user(id).await? else {
            return Ok(false);
        };

        let mut conn = self.conn.clone();
        redis::pipe()
            .atomic()
            .cmd("DEL")
            .arg(user_key(id))
            .ignore()
            .cmd("DEL")
            .arg(email_key(&existing.email))
            .ignore()
            .cmd("ZREM")
            .arg(USER_IDS)
            .arg(id)
            .ignore()
            .query_async::<()>(&mut conn)
            .await
            .map_err(classify)?;
        Ok(true)
    }
}

impl RedisStore {
    /// Best effort; a leaked claim only blocks re-use of that email.
    async fn release_email(&self, email: &str) {
        self.discard(&email_key(email)).await;
    }

    /// Best-effort `DEL` used to undo a partial write.
    async fn discard(&self, key: &str) {
        let mut conn = self.conn.clone();
        if let Err(e) = redis::cmd("DEL")
            .arg(key)
            .query_async::<i64>(&mut conn)
            .await
        {
            warn!("Failed to delete {}: {}", key, e);
        }
    }
}

/// Judges an email claim that `SET NX` refused. The claim already standing
/// for `user_id` is fine; any other owner, or none left by a concurrent
/// release, is a conflict.
fn check_claim(email: &str, owner: Option<&str>, user_id: &str) -> PortResult<()> {
    if owner == Some(user_id) {
        return Ok(());
    }
    Err(PortError::Conflict(format!(
        "Email {} is already registered",
        email
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(course_key("42"), "course:42");
        assert_eq!(user_key("7"), "user:7");
        assert_eq!(email_key("a@b.io"), "user:email:a@b.io");
    }

    #[test]
    fn test_refused_claim_only_stands_for_its_owner() {
        assert!(check_claim("a@b.io", Some("u1"), "u1").is_ok());
        assert!(matches!(
            check_claim("a@b.io", Some("u2"), "u1"),
            Err(PortError::Conflict(_))
        ));
        assert!(matches!(
            check_claim("a@b.io", None, "u1"),
            Err(PortError::Conflict(_))
        ));
    }

    #[test]
    fn test_corrupt_document_is_unexpected() {
        assert!(matches!(
            decode_course("{not json"),
            Err(PortError::Unexpected(_))
        ));
    }
}
