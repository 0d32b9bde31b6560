//! Operational alerting for server errors.
//!
//! 5xx responses are reported to a webhook as a detached side effect: the
//! HTTP response is already decided when the notification fires, and a
//! notification failure is only logged.

use albar_types::error::{Error, Result};
use async_trait::async_trait;
use serde_json::json;

/// Alert channel abstraction
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Report a server error
    async fn notify(&self, status: u16, message: &str) -> Result<()>;
}

/// Webhook-backed notifier
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Create a notifier posting to the given webhook URL
    pub fn new(url: String) -> Self {
        Self { url, client: reqwest::Client::new() }
    }
}

#[async_trait]
impl AlertNotifier for WebhookNotifier {
    async fn notify(&self, status: u16, message: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "status": status, "message": message }))
            .send()
            .await
            .map_err(|e| Error::external(format!("Alert webhook failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::external(format!(
                "Alert webhook answered {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Mock notifier: logs the alert and succeeds
pub struct MockAlertNotifier;

impl MockAlertNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockAlertNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertNotifier for MockAlertNotifier {
    async fn notify(&self, status: u16, message: &str) -> Result<()> {
        tracing::info!(status, message, "MockAlertNotifier: alert logged (not sent)");
        Ok(())
    }
}
