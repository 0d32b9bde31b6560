// Test fixtures are allowed to use unwrap/expect for clear failure messages
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Test fixtures and utilities for Albar API integration tests.
//!
//! Provides shared helpers to eliminate duplication across integration
//! tests. Everything works against the axum router with the in-memory
//! storage backend and mock collaborators.
//!
//! # Usage
//!
//! ```ignore
//! use albar_core::IdGenerator;
//! use albar_test_fixtures::{create_test_app, create_test_state, register_user};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let _ = IdGenerator::init(1);
//!     let state = create_test_state();
//!     let app = create_test_app(state);
//!
//!     let token = register_user(&app, "test@example.com", "password123").await;
//!     // Use the bearer token for authenticated requests...
//! }
//! ```

use std::sync::Arc;

use albar_api::{AppState, create_router_with_state};
use albar_core::UserRepository;
use albar_storage::MemoryBackend;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
    response::Response as AxumResponse,
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Creates a test AppState with in-memory storage and mock collaborators.
pub fn create_test_state() -> AppState {
    AppState::new_test(Arc::new(MemoryBackend::new()))
}

/// Creates the fully configured router for test requests via
/// `tower::ServiceExt::oneshot`.
pub fn create_test_app(state: AppState) -> Router {
    create_router_with_state(state)
}

/// Sends one request and returns the raw response.
///
/// `token` adds a bearer Authorization header; `body` is sent as JSON.
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> AxumResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

/// Sends one multipart request with a single file field.
pub async fn multipart_request(
    app: &Router,
    method: &str,
    uri: &str,
    token: &str,
    field: &str,
    filename: &str,
    bytes: &[u8],
) -> AxumResponse {
    const BOUNDARY: &str = "albar-test-boundary";

    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads a response body as raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

/// Registers a user (left pending) and returns their bearer token.
///
/// # Panics
///
/// Panics if registration does not answer 201 with a token.
pub async fn register_user(app: &Router, email: &str, password: &str) -> String {
    let response = request(
        app,
        "POST",
        "/api/user/register",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED, "registration should succeed");

    let body = body_json(response).await;
    body["token"].as_str().expect("registration returns a token").to_string()
}

/// Logs a user in and returns a fresh bearer token.
pub async fn login_user(app: &Router, email: &str, password: &str) -> String {
    let response = request(
        app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login should succeed");

    let body = body_json(response).await;
    body["token"].as_str().expect("login returns a token").to_string()
}

/// Marks an account as verified directly through the repository,
/// sidestepping the emailed code.
pub async fn verify_user_by_email(state: &AppState, email: &str) {
    let users = UserRepository::new((*state.storage).clone());
    let mut user = users
        .get_by_email(email)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no user registered as {email}"));
    user.mark_verified();
    users.update(user).await.unwrap();
}

/// Registers a user, verifies them externally, and returns their token.
pub async fn register_verified_user(
    app: &Router,
    state: &AppState,
    email: &str,
    password: &str,
) -> String {
    let token = register_user(app, email, password).await;
    verify_user_by_email(state, email).await;
    token
}

/// Gives the authenticated user a company profile with the given cif.
pub async fn setup_company(app: &Router, token: &str, name: &str, cif: &str) {
    let response = request(
        app,
        "PATCH",
        "/api/user/company",
        Some(token),
        Some(json!({ "name": name, "cif": cif, "address": "Calle Falsa 123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "company setup should succeed");
}
