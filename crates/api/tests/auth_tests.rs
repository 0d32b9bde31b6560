#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for registration, login, the login-attempt lockout,
//! and the password recovery flow.

use albar_core::{IdGenerator, UserRepository};
use albar_test_fixtures::{
    body_json, create_test_app, create_test_state, register_user, register_verified_user, request,
};
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_register_creates_pending_account() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    let response = request(
        &app,
        "POST",
        "/api/user/register",
        None,
        Some(json!({ "email": "a@b.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], "a@b.com");
    assert_eq!(body["user"]["status"], "pending");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_register_duplicate_email_rejected() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    register_user(&app, "eve@example.com", "Password123").await;

    let response = request(
        &app,
        "POST",
        "/api/user/register",
        None,
        Some(json!({ "email": "eve@example.com", "password": "OtherPassword456" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    // Malformed email
    let response = request(
        &app,
        "POST",
        "/api/user/register",
        None,
        Some(json!({ "email": "not-an-email", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Short password
    let response = request(
        &app,
        "POST",
        "/api/user/register",
        None,
        Some(json!({ "email": "ok@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_pending_account_flags_state() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    register_user(&app, "pending@example.com", "Password123").await;

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "pending@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("pendiente"));
    assert_eq!(body["user"]["status"], "pending");
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_verified_account_has_no_warning() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    register_verified_user(&app, &state, "ok@example.com", "Password123").await;

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "ok@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body.get("message").is_none());
    assert_eq!(body["user"]["status"], "verified");
}

#[tokio::test]
async fn test_login_unknown_email_is_401() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_rejects_pending_account() {
    // Pending status must not bypass the password check
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    register_user(&app, "pend@example.com", "Password123").await;

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "pend@example.com", "password": "WrongPassword1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_three_wrong_passwords_disable_the_account() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    register_verified_user(&app, &state, "lock@example.com", "Password123").await;

    // First two wrong attempts: 401 with the remaining count
    for remaining in [2, 1] {
        let response = request(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({ "email": "lock@example.com", "password": "WrongPassword1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(
            body["error"].as_str().unwrap().contains(&remaining.to_string()),
            "message should name {remaining} remaining attempts"
        );
    }

    // Third strike disables the account
    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "lock@example.com", "password": "WrongPassword1" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // A fourth attempt fails 403 even with the correct password
    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "lock@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_successful_login_resets_the_counter() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    register_verified_user(&app, &state, "count@example.com", "Password123").await;

    // Burn two attempts, then log in
    for _ in 0..2 {
        request(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({ "email": "count@example.com", "password": "WrongPassword1" })),
        )
        .await;
    }
    request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "count@example.com", "password": "Password123" })),
    )
    .await;

    // Two more wrong attempts must not disable: the counter was reset
    for _ in 0..2 {
        let response = request(
            &app,
            "POST",
            "/api/user/login",
            None,
            Some(json!({ "email": "count@example.com", "password": "WrongPassword1" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_missing_or_invalid_token_is_401() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state);

    let response = request(&app, "GET", "/api/user/me", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = request(&app, "GET", "/api/user/me", Some("garbage.token.here"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    register_verified_user(&app, &state, "forgot@example.com", "Password123").await;

    // Unknown email answers 404
    let response = request(
        &app,
        "POST",
        "/api/user/recover",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Request a token
    let response = request(
        &app,
        "POST",
        "/api/user/recover",
        None,
        Some(json!({ "email": "forgot@example.com" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token travels by email; read it back from storage
    let users = UserRepository::new((*state.storage).clone());
    let token = users
        .get_by_email("forgot@example.com")
        .await
        .unwrap()
        .unwrap()
        .reset_token
        .expect("recover stores a reset token");

    // A wrong token answers 400
    let response = request(
        &app,
        "PUT",
        "/api/user/reset-password",
        None,
        Some(json!({ "token": "ff".repeat(32), "newPassword": "NewPassword456" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The real token resets the password
    let response = request(
        &app,
        "PUT",
        "/api/user/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": "NewPassword456" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does
    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "forgot@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "forgot@example.com", "password": "NewPassword456" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The token was single-use
    let response = request(
        &app,
        "PUT",
        "/api/user/reset-password",
        None,
        Some(json!({ "token": token, "newPassword": "ThirdPassword789" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archived_account_cannot_login() {
    let _ = IdGenerator::init(30);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token =
        register_verified_user(&app, &state, "bye@example.com", "Password123").await;

    let response = request(&app, "DELETE", "/api/user", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = request(
        &app,
        "POST",
        "/api/user/login",
        None,
        Some(json!({ "email": "bye@example.com", "password": "Password123" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
