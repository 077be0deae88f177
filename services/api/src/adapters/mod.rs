pub mod documents;
pub mod jwt;
pub mod password;
pub mod postgres;
pub mod redis_store;

pub use jwt::JwtTokenIssuer;
pub use password::Argon2Hasher;
pub use postgres::PgDocumentStore;
pub use redis_store::RedisStore;
