use axum::{
    Router, middleware,
    routing::{delete, get, patch, post, put},
};

use crate::{
    handlers::{AppState, auth, clients, delivery_notes, projects, users},
    middleware::logging_middleware,
};

/// Create the router with state and middleware applied
///
/// Authentication is enforced by the `SessionContext` extractor on each
/// protected handler, so public and protected methods can share a path
/// (`POST` vs `PUT /api/user/register`).
pub fn create_router_with_state(state: AppState) -> axum::Router {
    Router::new()
        // Account routes (register shares its path between the public
        // registration POST and the authenticated onboarding PUT)
        .route(
            "/api/user/register",
            post(auth::register).put(users::update_onboarding),
        )
        .route("/api/user/login", post(auth::login))
        .route("/api/user/recover", post(auth::recover_password))
        .route("/api/user/reset-password", put(auth::reset_password))
        .route("/api/user/validation", put(users::validate_email))
        .route("/api/user/me", get(users::get_current_user))
        .route("/api/user/company", patch(users::update_company))
        .route("/api/user/logo", patch(users::update_logo))
        .route("/api/user/password", patch(users::change_password))
        .route("/api/user/restore", put(users::restore_user))
        .route("/api/user/invite", post(users::invite_user))
        .route("/api/user", delete(users::delete_user))
        // Client routes
        .route("/api/client", post(clients::create_client).get(clients::list_clients))
        .route("/api/client/archived", get(clients::list_archived_clients))
        .route(
            "/api/client/{id}",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/api/client/restore/{id}", put(clients::restore_client))
        // Project routes
        .route("/api/project", post(projects::create_project).get(projects::list_projects))
        .route("/api/project/archived", get(projects::list_archived_projects))
        .route(
            "/api/project/{id}",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route("/api/project/restore/{id}", put(projects::restore_project))
        // Delivery note routes
        .route(
            "/api/deliverynote",
            post(delivery_notes::create_note).get(delivery_notes::list_notes),
        )
        .route("/api/deliverynote/pdf/{id}", get(delivery_notes::generate_pdf))
        .route("/api/deliverynote/sign/{id}", patch(delivery_notes::sign_note))
        .route(
            "/api/deliverynote/{id}",
            get(delivery_notes::get_note).delete(delivery_notes::delete_note),
        )
        // Log all requests and alert on server errors
        .layer(middleware::from_fn_with_state(state.clone(), logging_middleware))
        .with_state(state)
}
