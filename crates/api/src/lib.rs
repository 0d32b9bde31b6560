#![deny(unsafe_code)]

//! # Albar API
//!
//! HTTP surface for the Albar business-records service: axum handlers,
//! bearer-session extraction, routing, and the server entry point.

pub mod handlers;
pub mod middleware;
pub mod routes;

use albar_types::error::{Error, Result};
pub use handlers::auth::{ApiError, AppState};
pub use routes::create_router_with_state;

/// Bind the configured listen address and serve requests until shutdown
pub async fn serve(state: AppState) -> Result<()> {
    let listen = state.config.listen;
    let app = create_router_with_state(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| Error::internal(format!("Failed to bind {listen}: {e}")))?;
    tracing::info!(%listen, "HTTP server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::internal(format!("Server error: {e}")))
}
