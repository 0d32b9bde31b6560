#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

//! Integration tests for delivery notes: teammate-scoped access, the
//! one-way signing workflow, the signed-note delete lockout, and PDF
//! rendering.

use albar_api::AppState;
use albar_core::{IdGenerator, UserRepository};
use albar_test_fixtures::{
    body_bytes, body_json, create_test_app, create_test_state, multipart_request,
    register_verified_user, request,
};
use axum::{Router, http::StatusCode};
use serde_json::json;

/// Creates a client and a project for the token; returns (client, project)
async fn create_client_and_project(app: &Router, token: &str) -> (i64, i64) {
    let response = request(
        app,
        "POST",
        "/api/client",
        Some(token),
        Some(json!({ "name": "Cliente X", "cif": "B12345678" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let client_id = body_json(response).await["client"]["id"].as_i64().unwrap();

    let response = request(
        app,
        "POST",
        "/api/project",
        Some(token),
        Some(json!({ "name": "Obra nueva", "client": client_id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let project_id = body_json(response).await["project"]["id"].as_i64().unwrap();

    (client_id, project_id)
}

/// Creates a one-entry hours note; returns its id
async fn create_note(app: &Router, token: &str, client_id: i64, project_id: i64) -> i64 {
    let response = request(
        app,
        "POST",
        "/api/deliverynote",
        Some(token),
        Some(json!({
            "clientId": client_id,
            "projectId": project_id,
            "type": "hours",
            "entries": [
                { "name": "Instalación eléctrica", "quantity": 8.0, "unit": "h" }
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["deliveryNote"]["id"].as_i64().unwrap()
}

/// Links two accounts as teammates in both directions, as the invite flow
/// does, so their notes become mutually visible.
async fn link_teammates(state: &AppState, email_a: &str, email_b: &str) {
    let users = UserRepository::new((*state.storage).clone());
    let mut a = users.get_by_email(email_a).await.unwrap().unwrap();
    let mut b = users.get_by_email(email_b).await.unwrap().unwrap();
    a.company_users.push(b.id);
    b.company_users.push(a.id);
    users.update(a).await.unwrap();
    users.update(b).await.unwrap();
}

#[tokio::test]
async fn test_create_note() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "n@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;

    let response = request(
        &app,
        "POST",
        "/api/deliverynote",
        Some(&token),
        Some(json!({
            "clientId": client_id,
            "projectId": project_id,
            "type": "materials",
            "entries": [
                { "name": "Cable", "quantity": 25.0, "unit": "m", "description": "Cable de cobre" },
                { "name": "Enchufes", "quantity": 6.0 }
            ]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["deliveryNote"]["type"], "materials");
    assert_eq!(body["deliveryNote"]["signed"], false);
    assert!(body["deliveryNote"]["signatureUrl"].is_null());
    assert_eq!(body["deliveryNote"]["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_note_validations() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "v@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;

    // No entries
    let response = request(
        &app,
        "POST",
        "/api/deliverynote",
        Some(&token),
        Some(json!({
            "clientId": client_id, "projectId": project_id, "type": "hours", "entries": []
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown client
    let response = request(
        &app,
        "POST",
        "/api/deliverynote",
        Some(&token),
        Some(json!({
            "clientId": 999999, "projectId": project_id, "type": "hours",
            "entries": [{ "name": "Horas", "quantity": 1.0 }]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_note_visibility_follows_teammate_lists() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let creator = register_verified_user(&app, &state, "creator@acme.com", "Password123").await;
    let mate = register_verified_user(&app, &state, "mate@acme.com", "Password123").await;
    let stranger =
        register_verified_user(&app, &state, "stranger@other.com", "Password123").await;

    let (client_id, project_id) = create_client_and_project(&app, &creator).await;
    let note_id = create_note(&app, &creator, client_id, project_id).await;

    link_teammates(&state, "creator@acme.com", "mate@acme.com").await;

    // The teammate lists and reads the note
    let response = request(&app, "GET", "/api/deliverynote", Some(&mate), None).await;
    let body = body_json(response).await;
    assert_eq!(body["deliveryNotes"].as_array().unwrap().len(), 1);

    let response =
        request(&app, "GET", &format!("/api/deliverynote/{note_id}"), Some(&mate), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The stranger sees nothing and gets 403 on the direct read
    let response = request(&app, "GET", "/api/deliverynote", Some(&stranger), None).await;
    let body = body_json(response).await;
    assert!(body["deliveryNotes"].as_array().unwrap().is_empty());

    let response =
        request(&app, "GET", &format!("/api/deliverynote/{note_id}"), Some(&stranger), None)
            .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Absent note: 404
    let response =
        request(&app, "GET", "/api/deliverynote/999999", Some(&stranger), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sign_note_scenario() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "sign@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;
    let note_id = create_note(&app, &token, client_id, project_id).await;

    let response = multipart_request(
        &app,
        "PATCH",
        &format!("/api/deliverynote/sign/{note_id}"),
        &token,
        "image",
        "firma.png",
        b"signature-image-bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["deliveryNote"]["signed"], true);
    assert!(body["deliveryNote"]["signatureUrl"].as_str().unwrap().contains("/ipfs/"));

    // Signing twice answers 400 and keeps the original signature
    let response = multipart_request(
        &app,
        "PATCH",
        &format!("/api/deliverynote/sign/{note_id}"),
        &token,
        "image",
        "otra.png",
        b"other-bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Deleting a signed note answers 403, soft and hard, every time
    for uri in [
        format!("/api/deliverynote/{note_id}"),
        format!("/api/deliverynote/{note_id}?soft=false"),
        format!("/api/deliverynote/{note_id}"),
    ] {
        let response = request(&app, "DELETE", &uri, Some(&token), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // The note is still there, still signed
    let response =
        request(&app, "GET", &format!("/api/deliverynote/{note_id}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["deliveryNote"]["signed"], true);
}

#[tokio::test]
async fn test_sign_requires_file_access_and_existence() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let owner = register_verified_user(&app, &state, "owner@example.com", "Password123").await;
    let outsider =
        register_verified_user(&app, &state, "out@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &owner).await;
    let note_id = create_note(&app, &owner, client_id, project_id).await;

    // Missing file field
    let response = multipart_request(
        &app,
        "PATCH",
        &format!("/api/deliverynote/sign/{note_id}"),
        &owner,
        "picture",
        "firma.png",
        b"bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Outsider cannot sign
    let response = multipart_request(
        &app,
        "PATCH",
        &format!("/api/deliverynote/sign/{note_id}"),
        &outsider,
        "image",
        "firma.png",
        b"bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Missing note
    let response = multipart_request(
        &app,
        "PATCH",
        "/api/deliverynote/sign/999999",
        &owner,
        "image",
        "firma.png",
        b"bytes",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // None of that signed the note
    let response =
        request(&app, "GET", &format!("/api/deliverynote/{note_id}"), Some(&owner), None).await;
    assert_eq!(body_json(response).await["deliveryNote"]["signed"], false);
}

#[tokio::test]
async fn test_delete_unsigned_note_lifecycle() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "del@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;

    // Soft delete (default)
    let archived = create_note(&app, &token, client_id, project_id).await;
    let response =
        request(&app, "DELETE", &format!("/api/deliverynote/{archived}"), Some(&token), None)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("archivado"));

    let response =
        request(&app, "GET", &format!("/api/deliverynote/{archived}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Hard delete
    let purged = create_note(&app, &token, client_id, project_id).await;
    let response = request(
        &app,
        "DELETE",
        &format!("/api/deliverynote/{purged}?soft=false"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("permanentemente"));

    let response = request(&app, "GET", "/api/deliverynote", Some(&token), None).await;
    assert!(body_json(response).await["deliveryNotes"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_pdf_rendering() {
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "pdf@example.com", "Password123").await;
    let outsider = register_verified_user(&app, &state, "far@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;
    let note_id = create_note(&app, &token, client_id, project_id).await;

    // Outsider gets 403, missing note 404
    let response =
        request(&app, "GET", &format!("/api/deliverynote/pdf/{note_id}"), Some(&outsider), None)
            .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response =
        request(&app, "GET", "/api/deliverynote/pdf/999999", Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Unsigned render: pdf content type, names and entries, no marker
    let response =
        request(&app, "GET", &format!("/api/deliverynote/pdf/{note_id}"), Some(&token), None)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap().to_str().unwrap(),
        "application/pdf"
    );
    assert!(
        response
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .contains(&format!("albaran-{note_id}.pdf"))
    );

    // The test renderer emits the document lines as plain text
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("Cliente: Cliente X"));
    assert!(text.contains("Proyecto: Obra nueva"));
    assert!(text.contains("Instalación eléctrica"));
    assert!(!text.contains("FIRMADO"));

    // Sign, then the marker appears
    multipart_request(
        &app,
        "PATCH",
        &format!("/api/deliverynote/sign/{note_id}"),
        &token,
        "image",
        "firma.png",
        b"signature-bytes",
    )
    .await;

    let response =
        request(&app, "GET", &format!("/api/deliverynote/pdf/{note_id}"), Some(&token), None)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("FIRMADO"));
}

#[tokio::test]
async fn test_pdf_renders_after_client_archived() {
    // Rendering resolves archived references; only the note itself has to
    // be active
    let _ = IdGenerator::init(70);
    let state = create_test_state();
    let app = create_test_app(state.clone());

    let token = register_verified_user(&app, &state, "arch@example.com", "Password123").await;
    let (client_id, project_id) = create_client_and_project(&app, &token).await;
    let note_id = create_note(&app, &token, client_id, project_id).await;

    let response =
        request(&app, "DELETE", &format!("/api/client/{client_id}"), Some(&token), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response =
        request(&app, "GET", &format!("/api/deliverynote/pdf/{note_id}"), Some(&token), None)
            .await;
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(text.contains("Cliente: Cliente X"));
}
