//! services/api/src/web/users.rs
//!
//! User endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::error::ApiError;
use crate::web::dto::{CreateUserRequest, EnrolledCourseResponse, UpdateUserRequest, UserResponse};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

/// POST /users - Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.users.create_user(req.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// GET /users - List users, oldest first
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses((status = 200, description = "All users", body = [UserResponse]))
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// GET /users/{id} - Fetch one user
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn get_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.get_user(&id).await?;
    Ok(Json(user.into()))
}

/// PATCH /users/{id} - Merge the supplied fields over the stored user
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 400, description = "Invalid field value"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.update_user(&id, req.into()).await?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id} - Delete a user; course references are left in place
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The deleted user", body = UserResponse),
        (status = 404, description = "No such user")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.delete_user(&id).await?;
    Ok(Json(user.into()))
}

/// GET /users/{id}/courses - The user's courses with their progress
#[utoipa::path(
    get,
    path = "/users/{id}/courses",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Enrolled courses", body = [EnrolledCourseResponse]),
        (status = 404, description = "No such user")
    )
)]
pub async fn user_courses_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<EnrolledCourseResponse>>, ApiError> {
    let courses = state.courses.enrolled_courses(&id).await?;
    Ok(Json(courses.into_iter().map(EnrolledCourseResponse::from).collect()))
}
