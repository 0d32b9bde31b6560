use albar_core::UserRepository;
use albar_types::{Error, entities::User};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::handlers::auth::{ApiError, AppState};

/// Context for authenticated requests
///
/// Extracted per handler argument rather than as a router layer: the public
/// `POST /api/user/register` and the protected `PUT /api/user/register`
/// share a path, so a path-scoped layer cannot separate them.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// The authenticated user, possibly archived
    pub user: User,
}

impl FromRequestParts<AppState> for SessionContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::auth("No hay token"))?;

        let token = header_value.strip_prefix("Bearer ").unwrap_or(header_value);
        let claims = state.tokens.verify(token)?;
        let user_id = claims.user_id()?;

        // Deliberately resolves archived accounts: an archived user still
        // authenticates far enough to inspect and restore their account.
        let users = UserRepository::new((*state.storage).clone());
        let user = users
            .get(user_id)
            .await?
            .ok_or_else(|| Error::auth("Token inválido (usuario no encontrado)"))?;

        Ok(SessionContext { user })
    }
}
