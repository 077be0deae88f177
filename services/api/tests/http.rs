//! End-to-end tests of the REST API over the in-memory store.

use std::sync::Arc;

use api_lib::adapters::JwtTokenIssuer;
use api_lib::config::Config;
use api_lib::storage::Storage;
use api_lib::web::{router, AppState};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use course_enrollment_core::ports::{PasswordHasher, PortResult};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Reversible stand-in so tests do not pay for Argon2.
struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> PortResult<String> {
        Ok(format!("plain${}", password))
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        Ok(hash.strip_prefix("plain$") == Some(password))
    }
}

fn app() -> Router {
    let config = Arc::new(
        Config::from_lookup(|key| match key {
            "STORAGE_BACKEND" => Some("memory".to_string()),
            "JWT_SECRET" => Some("integration-test-secret".to_string()),
            "RETRY_BASE_DELAY_MS" => Some("1".to_string()),
            _ => None,
        })
        .unwrap(),
    );
    let storage = Storage::memory();
    let tokens = Arc::new(JwtTokenIssuer::new(&config.jwt_secret, config.jwt_ttl));
    let state = AppState::new(
        config,
        storage.courses.clone(),
        storage.users.clone(),
        Arc::new(PlainHasher),
        tokens,
    );
    router(Arc::new(state))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn create_user(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/users",
        Some(json!({ "name": name, "email": email, "password": "secret" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

async fn create_course(app: &Router, creator_id: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/courses",
        Some(json!({
            "name": "Rust",
            "shortDescription": "Ownership and borrowing",
            "bannerImage": "banner.png",
            "mainImage": "main.png",
            "creatorId": creator_id
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_str().unwrap().to_string()
}

//=========================================================================================
// Users
//=========================================================================================

#[tokio::test]
async fn test_user_lifecycle() {
    let app = app();
    let id = create_user(&app, "Ana", "ana@example.com").await;

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("ana@example.com"));
    assert!(body.get("passwordHash").is_none());
    assert!(!body.to_string().contains("plain$"));

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/users/{}", id),
        Some(json!({ "name": "Ana Maria" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], json!("Ana Maria"));
    assert_eq!(body["email"], json!("ana@example.com"));

    let (status, body) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!(404));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = app();
    create_user(&app, "Ana", "ana@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "Other", "email": "ana@example.com", "password": "x" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], json!(409));
}

#[tokio::test]
async fn test_invalid_user_input_is_bad_request() {
    let app = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({ "name": "Ana", "email": "not-an-email", "password": "x" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_incomplete_user_body_is_json_bad_request() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/users", Some(json!({ "name": "x" })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].as_str().unwrap().contains("email"), "{}", body);

    let (status, body) = send(&app, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_unparseable_body_is_json_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], json!(400));

    // A body without the JSON content type is rejected the same way.
    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Courses
//=========================================================================================

#[tokio::test]
async fn test_course_requires_existing_creator() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/courses",
        Some(json!({
            "name": "Rust",
            "shortDescription": "s",
            "creatorId": "nobody"
        })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));

    let (status, _) = send(&app, Method::GET, "/courses/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rating_is_a_running_mean() {
    let app = app();
    let creator = create_user(&app, "Ana", "ana@example.com").await;
    let course = create_course(&app, &creator).await;
    let uri = format!("/courses/{}/rating", course);

    send(&app, Method::PATCH, &uri, Some(json!({ "rating": 4 })), None).await;
    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "rating": 5 })), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rating"], json!(4.5));
    assert_eq!(body["totalRatings"], json!(2));

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "rating": 6 })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mistyped_rating_is_json_bad_request() {
    let app = app();
    let creator = create_user(&app, "Ana", "ana@example.com").await;
    let course = create_course(&app, &creator).await;
    let uri = format!("/courses/{}/rating", course);

    let (status, body) = send(&app, Method::PATCH, &uri, Some(json!({ "rating": "five" })), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].is_string());

    let (_, body) = send(&app, Method::GET, &format!("/courses/{}", course), None, None).await;
    assert_eq!(body["totalRatings"], json!(0));
}

#[tokio::test]
async fn test_comment_reactions() {
    let app = app();
    let creator = create_user(&app, "Ana", "ana@example.com").await;
    let course = create_course(&app, &creator).await;

    let (status, comment) = send(
        &app,
        Method::PATCH,
        &format!("/courses/{}/comments", course),
        Some(json!({ "author": "Ana", "title": "Great", "detail": "Loved it" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["likes"], json!(0));
    let comment_id = comment["id"].as_str().unwrap();

    let like = format!("/courses/{}/comments/{}/like", course, comment_id);
    let dislike = format!("/courses/{}/comments/{}/dislike", course, comment_id);
    send(&app, Method::PATCH, &like, None, None).await;
    send(&app, Method::PATCH, &like, None, None).await;
    let (status, body) = send(&app, Method::PATCH, &dislike, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likes"], json!(2));
    assert_eq!(body["dislikes"], json!(1));

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/courses/{}/comments/unknown/like", course),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_enrollment_and_progress_flow() {
    let app = app();
    let creator = create_user(&app, "Ana", "ana@example.com").await;
    let student = create_user(&app, "Ben", "ben@example.com").await;
    let course = create_course(&app, &creator).await;

    // --- Catalog: one unit with two classes ---
    let (status, unit) = send(
        &app,
        Method::POST,
        &format!("/courses/{}/units", course),
        Some(json!({ "unitId": "u1", "name": "Basics" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(unit["classes"], json!([]));

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/courses/{}/units", course),
        Some(json!({ "unitId": "u1", "name": "Again" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for class_id in ["c1", "c2"] {
        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/courses/{}/units/u1/classes", course),
            Some(json!({ "classId": class_id, "name": class_id })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // --- Enrollment ---
    let enroll = format!("/{}/enroll/{}", student, course);
    let (status, body) = send(&app, Method::PATCH, &enroll, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enrollments"][0]["userId"], json!(student));

    let (status, _) = send(&app, Method::PATCH, &enroll, None, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // --- Progress ---
    let progress = format!("/courses/{}/users/{}/progress", course, student);
    let (status, body) = send(&app, Method::GET, &progress, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"], json!([]));

    for _ in 0..2 {
        let (status, body) = send(
            &app,
            Method::PATCH,
            &progress,
            Some(json!({ "unitId": "u1", "classId": "c1" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["progress"].as_array().unwrap().len(), 1);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("{}/percentage", progress),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "percentage": 50 }));

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/users/{}/courses", student),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["courseId"], json!(course));
    assert_eq!(body[0]["percentage"], json!(50));
}

//=========================================================================================
// Auth
//=========================================================================================

#[tokio::test]
async fn test_register_login_and_protected_route() {
    let app = app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "secret" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());
    assert!(body["access_token"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "ana@example.com", "password": "secret" })),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, body) = send(&app, Method::GET, "/protected", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("ana@example.com"));

    let (status, _) = send(&app, Method::GET, "/protected", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, Method::GET, "/protected", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], json!(401));
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = app();
    create_user(&app, "Ana", "ana@example.com").await;

    let (wrong_pw, wrong_pw_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "ana@example.com", "password": "nope" })),
        None,
    )
    .await;
    let (unknown, unknown_body) = send(
        &app,
        Method::POST,
        "/auth/login",
        Some(json!({ "email": "ghost@example.com", "password": "secret" })),
        None,
    )
    .await;

    assert_eq!(wrong_pw, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw_body, unknown_body);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/courses"].is_object());
}
