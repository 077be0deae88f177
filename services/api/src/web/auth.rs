//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and the token-guarded check route.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use course_enrollment_core::domain::TokenClaims;

use crate::error::ApiError;
use crate::web::dto::{ClaimsResponse, LoginRequest, RegisterRequest, RegisterResponse, TokenResponse};
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/register - Create an account and sign in
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = RegisterResponse),
        (status = 400, description = "Invalid name, email or password"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let registration = state.auth.register(req.into()).await?;
    let response = RegisterResponse {
        message: "User registered successfully".to_string(),
        access_token: registration.access_token,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login - Exchange credentials for an access token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let access_token = state.auth.login(&req.email, &req.password).await?;
    Ok(Json(TokenResponse { access_token }))
}

/// GET /protected - Echo the identity of a valid bearer token
#[utoipa::path(
    get,
    path = "/protected",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The token's claims", body = ClaimsResponse),
        (status = 401, description = "Missing, invalid or expired token")
    )
)]
pub async fn protected_handler(Extension(claims): Extension<TokenClaims>) -> Json<ClaimsResponse> {
    Json(claims.into())
}
