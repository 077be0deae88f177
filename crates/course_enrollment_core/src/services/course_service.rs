//! crates/course_enrollment_core/src/services/course_service.rs
//!
//! Course lifecycle, comments and reactions, the unit/class catalog,
//! enrollment, and per-user viewing progress.
//!
//! Every mutation is a read-modify-write of the whole Course aggregate, done
//! under the per-course lock so that concurrent requests against the same
//! course cannot overwrite each other within this process.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    Class, ClassView, Comment, Course, EnrolledCourse, Enrollment, NewComment, NewCourse,
    Progress, Reaction, Unit,
};
use crate::error::{DomainError, DomainResult};
use crate::locks::AggregateLocks;
use crate::ports::CourseRepository;
use crate::retry::RetryPolicy;
use crate::services::UserService;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

pub struct CourseService {
    courses: Arc<dyn CourseRepository>,
    users: Arc<UserService>,
    retry: RetryPolicy,
    locks: AggregateLocks,
}

impl CourseService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        users: Arc<UserService>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            courses,
            users,
            retry,
            locks: AggregateLocks::new(),
        }
    }

    //=====================================================================================
    // Lifecycle
    //=====================================================================================

    pub async fn create_course(&self, data: NewCourse, creator_id: &str) -> DomainResult<Course> {
        if data.name.trim().is_empty() {
            return Err(DomainError::Validation("course name must not be empty".to_string()));
        }
        if !self.users.exists(creator_id).await? {
            return Err(DomainError::Validation(format!(
                "creator {} does not exist",
                creator_id
            )));
        }
        validate_catalog(&data.units)?;

        let mut enrolled = HashSet::new();
        for enrollment in &data.enrollments {
            if !enrolled.insert(enrollment.user_id.as_str()) {
                return Err(DomainError::Validation(format!(
                    "user {} is enrolled more than once",
                    enrollment.user_id
                )));
            }
            if !self.users.exists(&enrollment.user_id).await? {
                return Err(DomainError::Validation(format!(
                    "enrolled user {} does not exist",
                    enrollment.user_id
                )));
            }
        }

        let mut tracked = HashSet::new();
        for progress in &data.progress {
            if !tracked.insert(progress.user_id.as_str()) {
                return Err(DomainError::Validation(format!(
                    "user {} has more than one progress record",
                    progress.user_id
                )));
            }
        }

        let course = Course {
            id: Uuid::new_v4().to_string(),
            name: data.name,
            short_description: data.short_description,
            banner_image: data.banner_image,
            main_image: data.main_image,
            creator_id: creator_id.to_string(),
            rating: 0.0,
            total_ratings: 0,
            comments: data.comments,
            units: data.units,
            enrollments: data.enrollments,
            progress: data.progress,
            created_at: Utc::now(),
        };

        let course = self.courses.insert_course(course).await?;
        for enrollment in &course.enrollments {
            self.mirror_enrollment(&enrollment.user_id, &course.id, enrollment)
                .await;
        }
        info!("Created course {} by {}", course.id, creator_id);
        Ok(course)
    }

    pub async fn get_course(&self, id: &str) -> DomainResult<Course> {
        self.retry
            .run("get_course", move || self.courses.get_course(id))
            .await?
            .ok_or_else(|| DomainError::not_found("Course", id))
    }

    /// All courses, unpaginated.
    pub async fn list_courses(&self) -> DomainResult<Vec<Course>> {
        Ok(self
            .retry
            .run("list_courses", move || self.courses.list_courses())
            .await?)
    }

    /// Folds one rating into the running mean.
    pub async fn rate_course(&self, id: &str, value: f64) -> DomainResult<Course> {
        if !value.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(DomainError::Validation(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            )));
        }

        let _guard = self.locks.acquire(id).await;
        let mut course = self.get_course(id).await?;
        course.rating = running_mean(course.rating, course.total_ratings, value);
        course.total_ratings += 1;

        // Not retried: a write that landed but reported failure would be
        // applied twice.
        self.courses.save_course(&course).await?;
        Ok(course)
    }

    //=====================================================================================
    // Comments
    //=====================================================================================

    pub async fn add_comment(&self, course_id: &str, input: NewComment) -> DomainResult<Comment> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: input.author,
            date: Utc::now(),
            title: input.title,
            detail: input.detail,
            likes: 0,
            dislikes: 0,
        };
        course.comments.push(comment.clone());
        self.store(&course).await?;
        Ok(comment)
    }

    pub async fn react_to_comment(
        &self,
        course_id: &str,
        comment_id: &str,
        reaction: Reaction,
    ) -> DomainResult<Comment> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        let comment = course
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| DomainError::not_found("Comment", comment_id))?;
        match reaction {
            Reaction::Like => comment.likes += 1,
            Reaction::Dislike => comment.dislikes += 1,
        }
        let comment = comment.clone();

        self.store(&course).await?;
        Ok(comment)
    }

    //=====================================================================================
    // Catalog
    //=====================================================================================

    pub async fn add_unit(&self, course_id: &str, unit_id: &str, name: &str) -> DomainResult<Unit> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        if course.find_unit(unit_id).is_some() {
            return Err(DomainError::Conflict(format!(
                "Unit {} already exists in course {}",
                unit_id, course_id
            )));
        }
        let unit = Unit {
            unit_id: unit_id.to_string(),
            name: name.to_string(),
            classes: Vec::new(),
        };
        course.units.push(unit.clone());
        self.store(&course).await?;
        Ok(unit)
    }

    pub async fn add_class(
        &self,
        course_id: &str,
        unit_id: &str,
        class_id: &str,
        name: &str,
    ) -> DomainResult<Class> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        let unit = course
            .units
            .iter_mut()
            .find(|u| u.unit_id == unit_id)
            .ok_or_else(|| DomainError::not_found("Unit", unit_id))?;
        if unit.has_class(class_id) {
            return Err(DomainError::Conflict(format!(
                "Class {} already exists in unit {}",
                class_id, unit_id
            )));
        }
        let class = Class {
            class_id: class_id.to_string(),
            name: name.to_string(),
        };
        unit.classes.push(class.clone());

        self.store(&course).await?;
        Ok(class)
    }

    //=====================================================================================
    // Enrollment & Progress
    //=====================================================================================

    pub async fn enroll(&self, user_id: &str, course_id: &str) -> DomainResult<Course> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        if course.is_enrolled(user_id) {
            return Err(DomainError::Conflict(format!(
                "User {} is already enrolled in course {}",
                user_id, course_id
            )));
        }
        let enrollment = Enrollment {
            user_id: user_id.to_string(),
            enrolled_at: Utc::now(),
        };
        course.enrollments.push(enrollment.clone());
        self.store(&course).await?;

        self.mirror_enrollment(user_id, course_id, &enrollment).await;
        info!("Enrolled user {} in course {}", user_id, course_id);
        Ok(course)
    }

    /// Records that `user_id` has viewed one class. Idempotent.
    pub async fn mark_class_viewed(
        &self,
        course_id: &str,
        user_id: &str,
        unit_id: &str,
        class_id: &str,
    ) -> DomainResult<Progress> {
        let _guard = self.locks.acquire(course_id).await;
        let mut course = self.get_course(course_id).await?;

        let unit = course
            .find_unit(unit_id)
            .ok_or_else(|| DomainError::not_found("Unit", unit_id))?;
        if !unit.has_class(class_id) {
            return Err(DomainError::not_found("Class", class_id));
        }

        let index = match course.progress.iter().position(|p| p.user_id == user_id) {
            Some(index) => index,
            None => {
                course.progress.push(Progress {
                    user_id: user_id.to_string(),
                    entries: Vec::new(),
                });
                course.progress.len() - 1
            }
        };
        let progress = &mut course.progress[index];
        match progress
            .entries
            .iter_mut()
            .find(|e| e.unit_id == unit_id && e.class_id == class_id)
        {
            Some(entry) => entry.viewed = true,
            None => progress.entries.push(ClassView {
                unit_id: unit_id.to_string(),
                class_id: class_id.to_string(),
                viewed: true,
            }),
        }
        let progress = progress.clone();

        self.store(&course).await?;
        Ok(progress)
    }

    /// The user's progress record, or an empty one if nothing was viewed yet.
    pub async fn get_progress(&self, course_id: &str, user_id: &str) -> DomainResult<Progress> {
        let course = self.get_course(course_id).await?;
        Ok(course.progress_for(user_id).cloned().unwrap_or_else(|| Progress {
            user_id: user_id.to_string(),
            entries: Vec::new(),
        }))
    }

    pub async fn calculate_progress(&self, course_id: &str, user_id: &str) -> DomainResult<u8> {
        let course = self.get_course(course_id).await?;
        Ok(progress_percentage(&course, user_id))
    }

    /// The courses a user is enrolled in, with their current progress.
    /// Courses that no longer exist are skipped.
    pub async fn enrolled_courses(&self, user_id: &str) -> DomainResult<Vec<EnrolledCourse>> {
        let user = self.users.get_user(user_id).await?;

        let mut result = Vec::with_capacity(user.enrollments.len());
        for enrollment in &user.enrollments {
            let course_id = enrollment.course_id.as_str();
            let Some(course) = self
                .retry
                .run("get_course", move || self.courses.get_course(course_id))
                .await?
            else {
                continue;
            };
            result.push(EnrolledCourse {
                percentage: progress_percentage(&course, user_id),
                course_id: course.id,
                name: course.name,
                enrolled_at: enrollment.enrolled_at,
            });
        }
        Ok(result)
    }

    /// Ids whose course lock is currently held or awaited.
    #[cfg(test)]
    pub(crate) fn held_locks(&self) -> usize {
        self.locks.len()
    }

    async fn store(&self, course: &Course) -> DomainResult<()> {
        self.retry
            .run("save_course", move || self.courses.save_course(course))
            .await?;
        Ok(())
    }

    async fn mirror_enrollment(&self, user_id: &str, course_id: &str, enrollment: &Enrollment) {
        if let Err(e) = self
            .users
            .record_enrollment(user_id, course_id, enrollment.enrolled_at)
            .await
        {
            warn!(
                "Enrollment of {} in {} not mirrored on the user: {}",
                user_id, course_id, e
            );
        }
    }
}

//=========================================================================================
// Pure Helpers
//=========================================================================================

pub fn running_mean(mean: f64, count: u64, value: f64) -> f64 {
    (mean * count as f64 + value) / (count + 1) as f64
}

/// `round(viewed / total * 100)` with halves rounded up, computed in integers.
pub fn progress_percentage(course: &Course, user_id: &str) -> u8 {
    let total = course.total_classes();
    if total == 0 {
        return 0;
    }
    let Some(progress) = course.progress_for(user_id) else {
        return 0;
    };
    let viewed = progress.viewed_count();
    let percentage = (viewed * 200 + total) / (2 * total);
    percentage.min(100) as u8
}

fn validate_catalog(units: &[Unit]) -> DomainResult<()> {
    let mut unit_ids = HashSet::new();
    for unit in units {
        if !unit_ids.insert(unit.unit_id.as_str()) {
            return Err(DomainError::Validation(format!(
                "duplicate unit id {}",
                unit.unit_id
            )));
        }
        let mut class_ids = HashSet::new();
        for class in &unit.classes {
            if !class_ids.insert(class.class_id.as_str()) {
                return Err(DomainError::Validation(format!(
                    "duplicate class id {} in unit {}",
                    class.class_id, unit.unit_id
                )));
            }
        }
    }
    Ok(())
}
