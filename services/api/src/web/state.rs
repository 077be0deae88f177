//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use std::sync::Arc;

use course_enrollment_core::ports::{
    CourseRepository, PasswordHasher, TokenIssuer, UserRepository,
};
use course_enrollment_core::services::{AuthService, CourseService, UserService};

use crate::config::Config;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<UserService>,
    pub courses: Arc<CourseService>,
    pub auth: Arc<AuthService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the domain services over the given adapters.
    pub fn new(
        config: Arc<Config>,
        course_repo: Arc<dyn CourseRepository>,
        user_repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        let users = Arc::new(UserService::new(
            user_repo,
            hasher.clone(),
            config.retry,
        ));
        let courses = Arc::new(CourseService::new(
            course_repo,
            users.clone(),
            config.retry,
        ));
        let auth = Arc::new(AuthService::new(users.clone(), hasher, tokens));

        Self {
            users,
            courses,
            auth,
            config,
        }
    }
}
