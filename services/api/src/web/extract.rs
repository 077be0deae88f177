//! services/api/src/web/extract.rs
//!
//! Request extractors whose rejections use the API's JSON error body.

use axum::extract::FromRequest;

use crate::error::ApiError;

/// `axum::Json` with malformed or mistyped bodies rejected as `400` through
/// [`ApiError`] rather than axum's plain-text `422`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
