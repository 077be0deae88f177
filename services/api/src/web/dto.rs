//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API and their conversions from
//! the domain types. Responses never carry a password hash.

use chrono::{DateTime, Utc};
use course_enrollment_core::domain::{
    Class, ClassView, Comment, Course, EnrolledCourse, Enrollment, NewComment, NewCourse, NewUser,
    Progress, TokenClaims, Unit, User, UserEnrollment, UserUpdate,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

//=========================================================================================
// Users
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
        }
    }
}

/// Every field is optional; omitted fields keep their stored value.
#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateUserRequest> for UserUpdate {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub enrollments: Vec<UserEnrollmentResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserEnrollmentResponse {
    pub course_id: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            enrollments: user
                .enrollments
                .into_iter()
                .map(|e: UserEnrollment| UserEnrollmentResponse {
                    course_id: e.course_id,
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            created_at: user.created_at,
        }
    }
}

/// One row of `GET /users/{id}/courses`.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseResponse {
    pub course_id: String,
    pub name: String,
    pub enrolled_at: DateTime<Utc>,
    pub percentage: u8,
}

impl From<EnrolledCourse> for EnrolledCourseResponse {
    fn from(e: EnrolledCourse) -> Self {
        Self {
            course_id: e.course_id,
            name: e.name,
            enrolled_at: e.enrolled_at,
            percentage: e.percentage,
        }
    }
}

//=========================================================================================
// Courses
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub name: String,
    pub short_description: String,
    #[serde(default)]
    pub banner_image: String,
    #[serde(default)]
    pub main_image: String,
    pub creator_id: String,
    /// An optional initial catalog.
    #[serde(default)]
    pub units: Vec<UnitPayload>,
    /// Optional pre-enrolled users; each must exist.
    #[serde(default)]
    pub enrollments: Vec<EnrollmentPayload>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitPayload {
    pub unit_id: String,
    pub name: String,
    #[serde(default)]
    pub classes: Vec<AddClassRequest>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentPayload {
    pub user_id: String,
    /// Defaults to the time of the request.
    pub enrolled_at: Option<DateTime<Utc>>,
}

impl CreateCourseRequest {
    /// Splits the payload into the domain input and the creator id.
    pub fn into_domain(self) -> (NewCourse, String) {
        let now = Utc::now();
        let data = NewCourse {
            name: self.name,
            short_description: self.short_description,
            banner_image: self.banner_image,
            main_image: self.main_image,
            units: self
                .units
                .into_iter()
                .map(|u| Unit {
                    unit_id: u.unit_id,
                    name: u.name,
                    classes: u
                        .classes
                        .into_iter()
                        .map(|c| Class {
                            class_id: c.class_id,
                            name: c.name,
                        })
                        .collect(),
                })
                .collect(),
            enrollments: self
                .enrollments
                .into_iter()
                .map(|e| Enrollment {
                    user_id: e.user_id,
                    enrolled_at: e.enrolled_at.unwrap_or(now),
                })
                .collect(),
            ..NewCourse::default()
        };
        (data, self.creator_id)
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub banner_image: String,
    pub main_image: String,
    pub creator_id: String,
    pub rating: f64,
    pub total_ratings: u64,
    pub comments: Vec<CommentResponse>,
    pub units: Vec<UnitResponse>,
    pub enrollments: Vec<EnrollmentResponse>,
    pub progress: Vec<ProgressResponse>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentResponse {
    pub user_id: String,
    pub enrolled_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            name: c.name,
            short_description: c.short_description,
            banner_image: c.banner_image,
            main_image: c.main_image,
            creator_id: c.creator_id,
            rating: c.rating,
            total_ratings: c.total_ratings,
            comments: c.comments.into_iter().map(CommentResponse::from).collect(),
            units: c.units.into_iter().map(UnitResponse::from).collect(),
            enrollments: c
                .enrollments
                .into_iter()
                .map(|e: Enrollment| EnrollmentResponse {
                    user_id: e.user_id,
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            progress: c.progress.into_iter().map(ProgressResponse::from).collect(),
            created_at: c.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct RateCourseRequest {
    /// Between 1 and 5 inclusive.
    pub rating: f64,
}

//=========================================================================================
// Comments
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct AddCommentRequest {
    pub author: String,
    pub title: String,
    pub detail: String,
}

impl From<AddCommentRequest> for NewComment {
    fn from(req: AddCommentRequest) -> Self {
        Self {
            author: req.author,
            title: req.title,
            detail: req.detail,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub detail: String,
    pub likes: u64,
    pub dislikes: u64,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            author: c.author,
            date: c.date,
            title: c.title,
            detail: c.detail,
            likes: c.likes,
            dislikes: c.dislikes,
        }
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUnitRequest {
    pub unit_id: String,
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddClassRequest {
    pub class_id: String,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnitResponse {
    pub unit_id: String,
    pub name: String,
    pub classes: Vec<ClassResponse>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassResponse {
    pub class_id: String,
    pub name: String,
}

impl From<Unit> for UnitResponse {
    fn from(u: Unit) -> Self {
        Self {
            unit_id: u.unit_id,
            name: u.name,
            classes: u.classes.into_iter().map(ClassResponse::from).collect(),
        }
    }
}

impl From<Class> for ClassResponse {
    fn from(c: Class) -> Self {
        Self {
            class_id: c.class_id,
            name: c.name,
        }
    }
}

//=========================================================================================
// Progress
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkViewedRequest {
    pub unit_id: String,
    pub class_id: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub user_id: String,
    pub progress: Vec<ClassViewResponse>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassViewResponse {
    pub unit_id: String,
    pub class_id: String,
    pub viewed: bool,
}

impl From<Progress> for ProgressResponse {
    fn from(p: Progress) -> Self {
        Self {
            user_id: p.user_id,
            progress: p
                .entries
                .into_iter()
                .map(|v: ClassView| ClassViewResponse {
                    unit_id: v.unit_id,
                    class_id: v.class_id,
                    viewed: v.viewed,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PercentageResponse {
    pub percentage: u8,
}

//=========================================================================================
// Auth
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        Self {
            name: req.name,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub access_token: String,
}

/// The identity carried by a verified token.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimsResponse {
    pub subject_id: String,
    pub email: String,
    pub expires_at: i64,
}

impl From<TokenClaims> for ClaimsResponse {
    fn from(c: TokenClaims) -> Self {
        Self {
            subject_id: c.subject_id,
            email: c.email,
            expires_at: c.expires_at,
        }
    }
}
