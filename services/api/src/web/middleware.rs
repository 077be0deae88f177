//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use course_enrollment_core::DomainError;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that validates the `Authorization: Bearer <token>` header.
///
/// If valid, inserts the token's `TokenClaims` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DomainError::Auth("missing bearer token".to_string()))?;

    // 2. Verify signature and expiry
    let claims = state.auth.verify_token(token)?;

    // 3. Insert the claims into request extensions
    req.extensions_mut().insert(claims);

    // 4. Continue to the handler
    Ok(next.run(req).await)
}
