pub mod auth;
pub mod courses;
pub mod dto;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod users;

pub use middleware::require_auth;
pub use rest::{router, ApiDoc};
pub use state::AppState;
