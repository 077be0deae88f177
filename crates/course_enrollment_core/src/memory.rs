//! crates/course_enrollment_core/src/memory.rs
//!
//! In-memory implementation of the persistence port. Used by the test suites
//! and by the `memory` storage backend of the API service.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Course, User};
use crate::ports::{CourseRepository, PortError, PortResult, UserRepository};

/// Stores both aggregates in insertion-ordered vectors.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    courses: Arc<RwLock<Vec<Course>>>,
    users: Arc<RwLock<Vec<User>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for MemoryStore {
    async fn insert_course(&self, course: Course) -> PortResult<Course> {
        let mut courses = self.courses.write().await;
        if courses.iter().any(|c| c.id == course.id) {
            return Err(PortError::Conflict(format!("Course {} already exists", course.id)));
        }
        courses.push(course.clone());
        Ok(course)
    }

    async fn get_course(&self, id: &str) -> PortResult<Option<Course>> {
        let courses = self.courses.read().await;
        Ok(courses.iter().find(|c| c.id == id).cloned())
    }

    async fn list_courses(&self) -> PortResult<Vec<Course>> {
        Ok(self.courses.read().await.clone())
    }

    async fn save_course(&self, course: &Course) -> PortResult<()> {
        let mut courses = self.courses.write().await;
        let slot = courses
            .iter_mut()
            .find(|c| c.id == course.id)
            .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course.id)))?;
        *slot = course.clone();
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: User) -> PortResult<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.id == user.id) {
            return Err(PortError::Conflict(format!("User {} already exists", user.id)));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: &str) -> PortResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn save_user(&self, user: &User) -> PortResult<()> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == user.email && u.id != user.id) {
            return Err(PortError::Conflict(format!(
                "Email {} is already registered",
                user.email
            )));
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user.id)))?;
        *slot = user.clone();
        Ok(())
    }

    async fn delete_user(&self, id: &str) -> PortResult<bool> {
        let mut users = self.users.write().await;
        let before = users.len();
        users.retain(|u| u.id != id);
        Ok(users.len() != before)
    }
}
