//! services/api/src/adapters/postgres.rs
//!
//! The document-store adapter: the concrete implementation of the persistence
//! ports on PostgreSQL using `sqlx`. Each aggregate is one JSONB document;
//! the user's email is duplicated into its own column for the unique index.

use async_trait::async_trait;
use course_enrollment_core::domain::{Course, User};
use course_enrollment_core::ports::{CourseRepository, PortError, PortResult, UserRepository};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::documents::{CourseDocument, UserDocument};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Creates a new `PgDocumentStore` over an already opened pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct CourseRecord {
    doc: Json<CourseDocument>,
}
impl CourseRecord {
    fn to_domain(self) -> Course {
        self.doc.0.to_domain()
    }
}

#[derive(FromRow)]
struct UserRecord {
    doc: Json<UserDocument>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        self.doc.0.to_domain()
    }
}

/// Sorts driver errors into the port's error kinds.
fn classify(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => PortError::Unavailable(e.to_string()),
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            PortError::Conflict(db.message().to_string())
        }
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// `CourseRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl CourseRepository for PgDocumentStore {
    async fn insert_course(&self, course: Course) -> PortResult<Course> {
        sqlx::query("INSERT INTO courses (id, doc) VALUES ($1, $2)")
            .bind(&course.id)
            .bind(Json(CourseDocument::from(&course)))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(course)
    }

    async fn get_course(&self, id: &str) -> PortResult<Option<Course>> {
        let record = sqlx::query_as::<_, CourseRecord>("SELECT doc FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        Ok(record.map(CourseRecord::to_domain))
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>("SELECT doc FROM courses ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        Ok(records.into_iter().map(CourseRecord::to_domain).collect())
    }

    async fn save_course(&self, course: &Course) -> PortResult<()> {
        let result =
            sqlx::query("UPDATE courses SET doc = $2, updated_at = now() WHERE id = $1")
                .bind(&course.id)
                .bind(Json(CourseDocument::from(course)))
                .execute(&self.pool)
                .await
                .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Course {} not found", course.id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for PgDocumentStore {
    async fn insert_user(&self, user: User) -> PortResult<User> {
        sqlx::query("INSERT INTO users (id, email, doc) VALUES ($1, $2, $3)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(Json(UserDocument::from(&user)))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>("SELECT doc FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>("SELECT doc FROM users ORDER BY seq ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(classify)?;
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn save_user(&self, user: &User) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET email = $2, doc = $3, updated_at = now() WHERE id = $1",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(Json(UserDocument::from(user)))
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }
}
