pub mod domain;
pub mod error;
pub mod locks;
pub mod memory;
pub mod ports;
pub mod retry;
pub mod services;

pub use domain::{
    Class, ClassView, Comment, Course, EnrolledCourse, Enrollment, NewComment, NewCourse, NewUser,
    Progress, Reaction, TokenClaims, Unit, User, UserEnrollment, UserUpdate,
};
pub use error::{DomainError, DomainResult};
pub use memory::MemoryStore;
pub use ports::{CourseRepository, PasswordHasher, PortError, PortResult, TokenIssuer, UserRepository};
pub use retry::RetryPolicy;
pub use services::{AuthService, CourseService, Registration, UserService};
