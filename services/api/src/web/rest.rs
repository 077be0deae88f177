//! services/api/src/web/rest.rs
//!
//! Assembles the REST API router and the master definition for the OpenAPI
//! specification.

use std::sync::Arc;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::web::{auth, courses, dto, middleware::require_auth, state::AppState, users};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        users::create_user_handler,
        users::list_users_handler,
        users::get_user_handler,
        users::update_user_handler,
        users::delete_user_handler,
        users::user_courses_handler,
        courses::create_course_handler,
        courses::list_courses_handler,
        courses::get_course_handler,
        courses::rate_course_handler,
        courses::add_comment_handler,
        courses::like_comment_handler,
        courses::dislike_comment_handler,
        courses::add_unit_handler,
        courses::add_class_handler,
        courses::enroll_handler,
        courses::mark_viewed_handler,
        courses::get_progress_handler,
        courses::progress_percentage_handler,
        auth::register_handler,
        auth::login_handler,
        auth::protected_handler,
    ),
    components(
        schemas(
            dto::CreateUserRequest,
            dto::UpdateUserRequest,
            dto::UserResponse,
            dto::EnrolledCourseResponse,
            dto::CreateCourseRequest,
            dto::CourseResponse,
            dto::RateCourseRequest,
            dto::AddCommentRequest,
            dto::CommentResponse,
            dto::AddUnitRequest,
            dto::AddClassRequest,
            dto::UnitResponse,
            dto::ClassResponse,
            dto::MarkViewedRequest,
            dto::ProgressResponse,
            dto::PercentageResponse,
            dto::LoginRequest,
            dto::RegisterRequest,
            dto::TokenResponse,
            dto::RegisterResponse,
            dto::ClaimsResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "User accounts."),
        (name = "courses", description = "Course lifecycle and rating."),
        (name = "comments", description = "Course comments and reactions."),
        (name = "catalog", description = "Units and classes of a course."),
        (name = "enrollment", description = "Enrollment and viewing progress."),
        (name = "auth", description = "Registration, login and token checks.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token scheme referenced by guarded routes.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Router
//=========================================================================================

/// Builds the complete application: API routes, Swagger UI, tracing and CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route(
            "/users",
            post(users::create_user_handler).get(users::list_users_handler),
        )
        .route(
            "/users/{id}",
            get(users::get_user_handler)
                .patch(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route("/users/{id}/courses", get(users::user_courses_handler))
        .route(
            "/courses",
            post(courses::create_course_handler).get(courses::list_courses_handler),
        )
        .route("/courses/{id}", get(courses::get_course_handler))
        .route("/courses/{id}/rating", patch(courses::rate_course_handler))
        .route("/courses/{id}/comments", patch(courses::add_comment_handler))
        .route(
            "/courses/{id}/comments/{comment_id}/like",
            patch(courses::like_comment_handler),
        )
        .route(
            "/courses/{id}/comments/{comment_id}/dislike",
            patch(courses::dislike_comment_handler),
        )
        .route("/courses/{id}/units", post(courses::add_unit_handler))
        .route(
            "/courses/{id}/units/{unit_id}/classes",
            post(courses::add_class_handler),
        )
        .route(
            "/courses/{id}/users/{user_id}/progress",
            patch(courses::mark_viewed_handler).get(courses::get_progress_handler),
        )
        .route(
            "/courses/{id}/users/{user_id}/progress/percentage",
            get(courses::progress_percentage_handler),
        )
        .route(
            "/{user_id}/enroll/{course_id}",
            patch(courses::enroll_handler),
        )
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/protected", get(auth::protected_handler))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/users",
            "/users/{id}",
            "/users/{id}/courses",
            "/courses",
            "/courses/{id}",
            "/courses/{id}/rating",
            "/courses/{id}/comments",
            "/courses/{courseId}/comments/{commentId}/like",
            "/courses/{courseId}/comments/{commentId}/dislike",
            "/courses/{courseId}/units",
            "/courses/{courseId}/units/{unitId}/classes",
            "/courses/{courseId}/users/{userId}/progress",
            "/courses/{courseId}/users/{userId}/progress/percentage",
            "/{userId}/enroll/{courseId}",
            "/auth/register",
            "/auth/login",
            "/protected",
        ] {
            assert!(paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
