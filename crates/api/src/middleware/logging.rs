use std::{sync::Arc, time::Instant};

use axum::{extract::{Request, State}, middleware::Next, response::Response};

use crate::handlers::auth::AppState;

/// Request logging plus fire-and-forget 5xx alerting
///
/// The alert runs detached after the response is decided; a notification
/// failure is logged and never affects the response.
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    tracing::info!(%method, path, status = status.as_u16(), latency_ms, "request");

    if status.is_server_error() {
        let notifier = Arc::clone(&state.notifier);
        let message = format!("{method} {path} responded {}", status.as_u16());
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(status.as_u16(), &message).await {
                tracing::warn!(error = %e, "Failed to deliver server-error alert");
            }
        });
    }

    response
}
