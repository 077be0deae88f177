pub mod auth_service;
pub mod course_service;
pub mod user_service;

pub use auth_service::{AuthService, Registration};
pub use course_service::{progress_percentage, running_mean, CourseService};
pub use user_service::UserService;

#[cfg(test)]
pub(crate) mod test_support;
