//! services/api/src/adapters/documents.rs
//!
//! The persisted JSON shape of the Course and User aggregates, shared by the
//! document-store (Postgres JSONB) and key-value (Redis) adapters. Field names
//! follow the legacy collection layout so existing documents stay readable.

use chrono::{DateTime, Utc};
use course_enrollment_core::domain::{
    Class, ClassView, Comment, Course, Enrollment, Progress, Unit, User, UserEnrollment,
};
use serde::{Deserialize, Serialize};

//=========================================================================================
// "Impure" Course Document Structs
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDocument {
    pub id: String,
    pub name: String,
    pub short_description: String,
    pub banner_image: String,
    pub main_image: String,
    pub creator_id: String,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_ratings: u64,
    #[serde(default)]
    pub comments: Vec<CommentDocument>,
    #[serde(default)]
    pub units: Vec<UnitDocument>,
    #[serde(rename = "UsersInscritos", default)]
    pub enrollments: Vec<EnrollmentDocument>,
    #[serde(rename = "UsersProgress", default)]
    pub progress: Vec<ProgressDocument>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDocument {
    pub id: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub title: String,
    pub detail: String,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub dislikes: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDocument {
    pub unit_id: String,
    pub name: String,
    #[serde(default)]
    pub classes: Vec<ClassDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDocument {
    pub class_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnrollmentDocument {
    #[serde(rename = "idUser")]
    pub user_id: String,
    #[serde(rename = "fechaInscripcion")]
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressDocument {
    #[serde(rename = "idUser")]
    pub user_id: String,
    #[serde(default)]
    pub progress: Vec<ClassViewDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassViewDocument {
    pub unit_id: String,
    pub class_id: String,
    #[serde(default)]
    pub viewed: bool,
}

impl From<&Course> for CourseDocument {
    fn from(c: &Course) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            short_description: c.short_description.clone(),
            banner_image: c.banner_image.clone(),
            main_image: c.main_image.clone(),
            creator_id: c.creator_id.clone(),
            rating: c.rating,
            total_ratings: c.total_ratings,
            comments: c
                .comments
                .iter()
                .map(|m| CommentDocument {
                    id: m.id.clone(),
                    author: m.author.clone(),
                    date: m.date,
                    title: m.title.clone(),
                    detail: m.detail.clone(),
                    likes: m.likes,
                    dislikes: m.dislikes,
                })
                .collect(),
            units: c
                .units
                .iter()
                .map(|u| UnitDocument {
                    unit_id: u.unit_id.clone(),
                    name: u.name.clone(),
                    classes: u
                        .classes
                        .iter()
                        .map(|k| ClassDocument {
                            class_id: k.class_id.clone(),
                            name: k.name.clone(),
                        })
                        .collect(),
                })
                .collect(),
            enrollments: c
                .enrollments
                .iter()
                .map(|e| EnrollmentDocument {
                    user_id: e.user_id.clone(),
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            progress: c
                .progress
                .iter()
                .map(|p| ProgressDocument {
                    user_id: p.user_id.clone(),
                    progress: p
                        .entries
                        .iter()
                        .map(|v| ClassViewDocument {
                            unit_id: v.unit_id.clone(),
                            class_id: v.class_id.clone(),
                            viewed: v.viewed,
                        })
                        .collect(),
                })
                .collect(),
            created_at: c.created_at,
        }
    }
}

impl CourseDocument {
    pub fn to_domain(self) -> Course {
        Course {
            id: self.id,
            name: self.name,
            short_description: self.short_description,
            banner_image: self.banner_image,
            main_image: self.main_image,
            creator_id: self.creator_id,
            rating: self.rating,
            total_ratings: self.total_ratings,
            comments: self
                .comments
                .into_iter()
                .map(|m| Comment {
                    id: m.id,
                    author: m.author,
                    date: m.date,
                    title: m.title,
                    detail: m.detail,
                    likes: m.likes,
                    dislikes: m.dislikes,
                })
                .collect(),
            units: self
                .units
                .into_iter()
                .map(|u| Unit {
                    unit_id: u.unit_id,
                    name: u.name,
                    classes: u
                        .classes
                        .into_iter()
                        .map(|k| Class {
                            class_id: k.class_id,
                            name: k.name,
                        })
                        .collect(),
                })
                .collect(),
            enrollments: self
                .enrollments
                .into_iter()
                .map(|e| Enrollment {
                    user_id: e.user_id,
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            progress: self
                .progress
                .into_iter()
                .map(|p| Progress {
                    user_id: p.user_id,
                    entries: p
                        .progress
                        .into_iter()
                        .map(|v| ClassView {
                            unit_id: v.unit_id,
                            class_id: v.class_id,
                            viewed: v.viewed,
                        })
                        .collect(),
                })
                .collect(),
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// "Impure" User Document Structs
//=========================================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(rename = "cursosInscritos", default)]
    pub enrollments: Vec<UserEnrollmentDocument>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserEnrollmentDocument {
    #[serde(rename = "idCurso")]
    pub course_id: String,
    #[serde(rename = "fechaInscripcion")]
    pub enrolled_at: DateTime<Utc>,
}

impl From<&User> for UserDocument {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            enrollments: u
                .enrollments
                .iter()
                .map(|e| UserEnrollmentDocument {
                    course_id: e.course_id.clone(),
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            created_at: u.created_at,
        }
    }
}

impl UserDocument {
    pub fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            enrollments: self
                .enrollments
                .into_iter()
                .map(|e| UserEnrollment {
                    course_id: e.course_id,
                    enrolled_at: e.enrolled_at,
                })
                .collect(),
            created_at: self.created_at,
        }
    }
}
