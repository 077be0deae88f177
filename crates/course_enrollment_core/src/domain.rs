//! crates/course_enrollment_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};

//=========================================================================================
// User Aggregate
//=========================================================================================

/// A registered user. Only the hash of the password is ever held.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub enrollments: Vec<UserEnrollment>,
    pub created_at: DateTime<Utc>,
}

/// The user-side mirror of an enrollment, pointing at a course by id.
#[derive(Debug, Clone, PartialEq)]
pub struct UserEnrollment {
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Input for creating a user. The password is plaintext here and is hashed
/// by the user service before anything is persisted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// A partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

//=========================================================================================
// Course Aggregate
//=========================================================================================

/// A course together with everything it owns: comments, the unit/class
/// catalog, enrollments and per-user progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub banner_image: String,
    pub main_image: String,
    pub creator_id: String,
    pub rating: f64,
    pub total_ratings: u64,
    pub comments: Vec<Comment>,
    pub units: Vec<Unit>,
    pub enrollments: Vec<Enrollment>,
    pub progress: Vec<Progress>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn total_classes(&self) -> usize {
        self.units.iter().map(|u| u.classes.len()).sum()
    }

    pub fn find_unit(&self, unit_id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.unit_id == unit_id)
    }

    pub fn is_enrolled(&self, user_id: &str) -> bool {
        self.enrollments.iter().any(|e| e.user_id == user_id)
    }

    pub fn progress_for(&self, user_id: &str) -> Option<&Progress> {
        self.progress.iter().find(|p| p.user_id == user_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub unit_id: String,
    pub name: String,
    pub classes: Vec<Class>,
}

impl Unit {
    pub fn has_class(&self, class_id: &str) -> bool {
        self.classes.iter().any(|c| c.class_id == class_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Class {
    pub class_id: String,
    pub name: String,
}

/// A comment on a course. The counters only ever go up.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub detail: String,
    pub likes: u64,
    pub dislikes: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Enrollment {
    pub user_id: String,
    pub enrolled_at: DateTime<Utc>,
}

/// Per-user viewing state within one course.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub user_id: String,
    pub entries: Vec<ClassView>,
}

impl Progress {
    pub fn viewed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.viewed).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassView {
    pub unit_id: String,
    pub class_id: String,
    pub viewed: bool,
}

/// Input for creating a course. Catalog, comments, enrollments and progress
/// may be pre-populated; everything else starts from zero.
#[derive(Debug, Clone, Default)]
pub struct NewCourse {
    pub name: String,
    pub short_description: String,
    pub banner_image: String,
    pub main_image: String,
    pub units: Vec<Unit>,
    pub comments: Vec<Comment>,
    pub enrollments: Vec<Enrollment>,
    pub progress: Vec<Progress>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub author: String,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Like,
    Dislike,
}

/// One entry of a user's "my courses" listing.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrolledCourse {
    pub course_id: String,
    pub name: String,
    pub enrolled_at: DateTime<Utc>,
    pub percentage: u8,
}

//=========================================================================================
// Authentication
//=========================================================================================

/// The claims carried by an issued session token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenClaims {
    pub subject_id: String,
    pub email: String,
    pub expires_at: i64,
}
