//! services/api/src/web/courses.rs
//!
//! Course endpoints: lifecycle, rating, comments, the unit/class catalog,
//! enrollment and per-user progress.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use course_enrollment_core::domain::Reaction;

use crate::error::ApiError;
use crate::web::dto::{
    AddClassRequest, AddCommentRequest, AddUnitRequest, ClassResponse, CommentResponse,
    CourseResponse, CreateCourseRequest, MarkViewedRequest, PercentageResponse, ProgressResponse,
    RateCourseRequest, UnitResponse,
};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

//=========================================================================================
// Lifecycle
//=========================================================================================

/// POST /courses - Create a course
#[utoipa::path(
    post,
    path = "/courses",
    tag = "courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Unknown creator or enrolled user, or an invalid catalog")
    )
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (data, creator_id) = req.into_domain();
    let course = state.courses.create_course(data, &creator_id).await?;
    Ok((StatusCode::CREATED, Json(CourseResponse::from(course))))
}

/// GET /courses - List courses, oldest first
#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    responses((status = 200, description = "All courses", body = [CourseResponse]))
)]
pub async fn list_courses_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = state.courses.list_courses().await?;
    Ok(Json(courses.into_iter().map(CourseResponse::from).collect()))
}

/// GET /courses/{id} - Fetch one course
#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    params(("id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "The course", body = CourseResponse),
        (status = 404, description = "No such course")
    )
)]
pub async fn get_course_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = state.courses.get_course(&id).await?;
    Ok(Json(course.into()))
}

/// PATCH /courses/{id}/rating - Submit one rating
#[utoipa::path(
    patch,
    path = "/courses/{id}/rating",
    tag = "courses",
    params(("id" = String, Path, description = "Course id")),
    request_body = RateCourseRequest,
    responses(
        (status = 200, description = "The course with its new average", body = CourseResponse),
        (status = 400, description = "Rating outside 1..=5"),
        (status = 404, description = "No such course")
    )
)]
pub async fn rate_course_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<RateCourseRequest>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = state.courses.rate_course(&id, req.rating).await?;
    Ok(Json(course.into()))
}

//=========================================================================================
// Comments
//=========================================================================================

/// PATCH /courses/{id}/comments - Append a comment
#[utoipa::path(
    patch,
    path = "/courses/{id}/comments",
    tag = "comments",
    params(("id" = String, Path, description = "Course id")),
    request_body = AddCommentRequest,
    responses(
        (status = 200, description = "The new comment", body = CommentResponse),
        (status = 404, description = "No such course")
    )
)]
pub async fn add_comment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AddCommentRequest>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state.courses.add_comment(&id, req.into()).await?;
    Ok(Json(comment.into()))
}

/// PATCH /courses/{courseId}/comments/{commentId}/like
#[utoipa::path(
    patch,
    path = "/courses/{courseId}/comments/{commentId}/like",
    tag = "comments",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "The updated comment", body = CommentResponse),
        (status = 404, description = "No such course or comment")
    )
)]
pub async fn like_comment_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state
        .courses
        .react_to_comment(&course_id, &comment_id, Reaction::Like)
        .await?;
    Ok(Json(comment.into()))
}

/// PATCH /courses/{courseId}/comments/{commentId}/dislike
#[utoipa::path(
    patch,
    path = "/courses/{courseId}/comments/{commentId}/dislike",
    tag = "comments",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("commentId" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "The updated comment", body = CommentResponse),
        (status = 404, description = "No such course or comment")
    )
)]
pub async fn dislike_comment_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, comment_id)): Path<(String, String)>,
) -> Result<Json<CommentResponse>, ApiError> {
    let comment = state
        .courses
        .react_to_comment(&course_id, &comment_id, Reaction::Dislike)
        .await?;
    Ok(Json(comment.into()))
}

//=========================================================================================
// Catalog
//=========================================================================================

/// POST /courses/{courseId}/units - Add a unit
#[utoipa::path(
    post,
    path = "/courses/{courseId}/units",
    tag = "catalog",
    params(("courseId" = String, Path, description = "Course id")),
    request_body = AddUnitRequest,
    responses(
        (status = 201, description = "Unit added", body = UnitResponse),
        (status = 404, description = "No such course"),
        (status = 409, description = "Unit id already used in this course")
    )
)]
pub async fn add_unit_handler(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    ApiJson(req): ApiJson<AddUnitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let unit = state
        .courses
        .add_unit(&course_id, &req.unit_id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(UnitResponse::from(unit))))
}

/// POST /courses/{courseId}/units/{unitId}/classes - Add a class to a unit
#[utoipa::path(
    post,
    path = "/courses/{courseId}/units/{unitId}/classes",
    tag = "catalog",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("unitId" = String, Path, description = "Unit id")
    ),
    request_body = AddClassRequest,
    responses(
        (status = 201, description = "Class added", body = ClassResponse),
        (status = 404, description = "No such course or unit"),
        (status = 409, description = "Class id already used in this unit")
    )
)]
pub async fn add_class_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, unit_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<AddClassRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let class = state
        .courses
        .add_class(&course_id, &unit_id, &req.class_id, &req.name)
        .await?;
    Ok((StatusCode::CREATED, Json(ClassResponse::from(class))))
}

//=========================================================================================
// Enrollment & Progress
//=========================================================================================

/// PATCH /{userId}/enroll/{courseId} - Enroll a user in a course
#[utoipa::path(
    patch,
    path = "/{userId}/enroll/{courseId}",
    tag = "enrollment",
    params(
        ("userId" = String, Path, description = "User id"),
        ("courseId" = String, Path, description = "Course id")
    ),
    responses(
        (status = 200, description = "The course with the new enrollment", body = CourseResponse),
        (status = 404, description = "No such course"),
        (status = 409, description = "Already enrolled")
    )
)]
pub async fn enroll_handler(
    State(state): State<Arc<AppState>>,
    Path((user_id, course_id)): Path<(String, String)>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = state.courses.enroll(&user_id, &course_id).await?;
    Ok(Json(course.into()))
}

/// PATCH /courses/{courseId}/users/{userId}/progress - Mark a class as viewed
#[utoipa::path(
    patch,
    path = "/courses/{courseId}/users/{userId}/progress",
    tag = "enrollment",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("userId" = String, Path, description = "User id")
    ),
    request_body = MarkViewedRequest,
    responses(
        (status = 200, description = "The user's progress record", body = ProgressResponse),
        (status = 404, description = "No such course, unit or class")
    )
)]
pub async fn mark_viewed_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, user_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<MarkViewedRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state
        .courses
        .mark_class_viewed(&course_id, &user_id, &req.unit_id, &req.class_id)
        .await?;
    Ok(Json(progress.into()))
}

/// GET /courses/{courseId}/users/{userId}/progress - The raw progress record
#[utoipa::path(
    get,
    path = "/courses/{courseId}/users/{userId}/progress",
    tag = "enrollment",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("userId" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "The user's progress record, possibly empty", body = ProgressResponse),
        (status = 404, description = "No such course")
    )
)]
pub async fn get_progress_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, user_id)): Path<(String, String)>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let progress = state.courses.get_progress(&course_id, &user_id).await?;
    Ok(Json(progress.into()))
}

/// GET /courses/{courseId}/users/{userId}/progress/percentage
#[utoipa::path(
    get,
    path = "/courses/{courseId}/users/{userId}/progress/percentage",
    tag = "enrollment",
    params(
        ("courseId" = String, Path, description = "Course id"),
        ("userId" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Viewed classes over all classes, rounded", body = PercentageResponse),
        (status = 404, description = "No such course")
    )
)]
pub async fn progress_percentage_handler(
    State(state): State<Arc<AppState>>,
    Path((course_id, user_id)): Path<(String, String)>,
) -> Result<Json<PercentageResponse>, ApiError> {
    let percentage = state
        .courses
        .calculate_progress(&course_id, &user_id)
        .await?;
    Ok(Json(PercentageResponse { percentage }))
}
