//! services/api/src/storage.rs
//!
//! Opens the configured backing store and hands out its repositories.

use std::sync::Arc;

use course_enrollment_core::ports::{CourseRepository, PasswordHasher, TokenIssuer, UserRepository};
use course_enrollment_core::MemoryStore;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::adapters::{Argon2Hasher, JwtTokenIssuer, PgDocumentStore, RedisStore};
use crate::config::{Config, StorageBackend};
use crate::error::ApiError;
use crate::web::state::AppState;

/// The repositories of one backend plus whatever must be released at shutdown.
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub users: Arc<dyn UserRepository>,
    pool: Option<PgPool>,
}

impl Storage {
    /// Connects to the configured backend. Postgres migrations run here.
    pub async fn connect(backend: &StorageBackend) -> Result<Self, ApiError> {
        match backend {
            StorageBackend::Postgres { database_url } => {
                info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(database_url)
                    .await?;
                let store = Arc::new(PgDocumentStore::new(pool.clone()));
                info!("Running database migrations...");
                store.run_migrations().await?;
                info!("Database migrations complete.");
                Ok(Self {
                    courses: store.clone(),
                    users: store,
                    pool: Some(pool),
                })
            }
            StorageBackend::Redis { redis_url } => {
                info!("Connecting to Redis...");
                let store = Arc::new(RedisStore::connect(redis_url).await?);
                Ok(Self {
                    courses: store.clone(),
                    users: store,
                    pool: None,
                })
            }
            StorageBackend::Memory => {
                info!("Using the in-memory store; data is lost on exit.");
                Ok(Self::memory())
            }
        }
    }

    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            courses: store.clone(),
            users: store,
            pool: None,
        }
    }

    /// Builds the shared state with the production hasher and token issuer.
    pub fn app_state(&self, config: Arc<Config>) -> Arc<AppState> {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());
        let tokens: Arc<dyn TokenIssuer> =
            Arc::new(JwtTokenIssuer::new(&config.jwt_secret, config.jwt_ttl));
        Arc::new(AppState::new(
            config,
            self.courses.clone(),
            self.users.clone(),
            hasher,
            tokens,
        ))
    }

    /// Waits for pooled connections to finish. The Redis manager closes on drop.
    pub async fn close(self) {
        if let Some(pool) = self.pool {
            info!("Closing database pool...");
            pool.close().await;
        }
    }
}
