pub mod auth;
pub mod clients;
pub mod delivery_notes;
pub mod projects;
pub mod users;

use serde::{Deserialize, Serialize};

pub use auth::{ApiError, AppState};

/// Single-message response envelope
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// `?soft=` query parameter shared by the delete routes
///
/// Any value other than the literal string `"false"` means soft delete.
#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub soft: Option<String>,
}

impl DeleteParams {
    pub fn is_soft(&self) -> bool {
        self.soft.as_deref() != Some("false")
    }
}
