//! Application state, error mapping, and the public authentication
//! endpoints: register, login, password recovery and reset.

use std::sync::Arc;

use albar_config::Config;
use albar_const::{duration::RESET_TOKEN_TTL_MINUTES, limits::MIN_PASSWORD_LENGTH};
use albar_core::{
    AlertNotifier, EmailService, IdGenerator, IpfsUploader, MockAlertNotifier, MockEmailSender,
    MockIpfsUploader, MockPdfRenderer, PasswordResetEmailTemplate, PdfRenderer, TokenService,
    UserRepository, VerificationEmailTemplate, email::EmailTemplate, generate_reset_token,
    generate_verification_code, hash_password, verify_password,
};
use albar_storage::MemoryBackend;
use albar_types::{
    entities::{User, UserStatus},
    error::Error,
};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::MessageResponse;

/// Shared application state: storage plus every collaborator seam
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<MemoryBackend>,
    pub config: Arc<Config>,
    pub tokens: Arc<TokenService>,
    pub email: Arc<EmailService>,
    pub ipfs: Arc<dyn IpfsUploader>,
    pub pdf: Arc<dyn PdfRenderer>,
    pub notifier: Arc<dyn AlertNotifier>,
}

impl AppState {
    /// Assemble the production state from config and wired collaborators
    pub fn new(
        storage: Arc<MemoryBackend>,
        config: Arc<Config>,
        email: Arc<EmailService>,
        ipfs: Arc<dyn IpfsUploader>,
        pdf: Arc<dyn PdfRenderer>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(&config.jwt_secret));
        Self { storage, config, tokens, email, ipfs, pdf, notifier }
    }

    /// State for integration tests: mock collaborators, fixed test secret
    pub fn new_test(storage: Arc<MemoryBackend>) -> Self {
        let config = Arc::new(Config::builder().jwt_secret("test-secret").build());
        Self::new(
            storage,
            config,
            Arc::new(EmailService::new(Box::new(MockEmailSender::new()))),
            Arc::new(MockIpfsUploader::new()),
            Arc::new(MockPdfRenderer::new()),
            Arc::new(MockAlertNotifier::new()),
        )
    }
}

/// Transport-layer error wrapper
///
/// Maps the domain error to its HTTP status and a single-field JSON
/// envelope `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.0.error_code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.0.error_code(), "Request rejected");
        }
        (status, Json(json!({ "error": self.0.message() }))).into_response()
    }
}

/// Result type alias for handler functions
pub type Result<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub email: String,
    pub status: UserStatus,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self { email: user.email.clone(), status: user.status, role: user.role.to_string() }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub user: UserSummary,
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Register a new account
///
/// POST /api/user/register (public)
///
/// Creates a pending user with a fresh verification code, emails the code,
/// and answers 201 with a bearer token. Duplicate emails (archived accounts
/// included) answer 409.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    User::validate_email(&payload.email)?;
    validate_password(&payload.password)?;

    let users = UserRepository::new((*state.storage).clone());
    if users.get_by_email(&payload.email).await?.is_some() {
        return Err(Error::already_exists("Email ya registrado").into());
    }

    let code = generate_verification_code();
    let user = User::builder()
        .id(IdGenerator::next_id())
        .email(payload.email)
        .password_hash(hash_password(&payload.password)?)
        .verification_code(code.clone())
        .create()?;
    users.create(user.clone()).await?;

    let token = state.tokens.sign(&user)?;

    let template = VerificationEmailTemplate { code: &code };
    state
        .email
        .send_email(&user.email, &template.subject(), &template.body_html(), &template.body_text())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: UserSummary::from(&user), token }),
    ))
}

/// Log in with email and password
///
/// POST /api/user/login (public)
///
/// Archived accounts are invisible here (soft delete disables login).
/// Wrong passwords burn an attempt; the third strike disables the account
/// and every later attempt answers 403 regardless of the password. A
/// pending account still logs in, flagged by a message.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let users = UserRepository::new((*state.storage).clone());

    let user = users
        .find_active_by_email(&payload.email)
        .await?
        .ok_or_else(|| Error::auth("Credenciales inválidas"))?;

    if user.status == UserStatus::Disabled {
        return Err(Error::authz("Tu cuenta ha sido deshabilitada.").into());
    }

    if !verify_password(&payload.password, &user.password_hash)? {
        let updated = users
            .record_failed_login(user.id)
            .await?
            .ok_or_else(|| Error::auth("Credenciales inválidas"))?;
        if updated.status == UserStatus::Disabled {
            return Err(Error::authz(
                "Tu cuenta ha sido deshabilitada por múltiples intentos fallidos de login.",
            )
            .into());
        }
        return Err(Error::auth(format!(
            "Credenciales inválidas. Intentos restantes: {}",
            updated.login_attempts
        ))
        .into());
    }

    let user = users
        .record_successful_login(user.id)
        .await?
        .ok_or_else(|| Error::auth("Credenciales inválidas"))?;

    let token = state.tokens.sign(&user)?;
    let message = (user.status == UserStatus::Pending)
        .then(|| "Tu cuenta está pendiente de verificación".to_string());

    Ok(Json(LoginResponse { message, user: UserSummary::from(&user), token }))
}

/// Start password recovery
///
/// POST /api/user/recover (public)
///
/// Stores a 15-minute reset token and emails it to the account.
pub async fn recover_password(
    State(state): State<AppState>,
    Json(payload): Json<RecoverRequest>,
) -> Result<Json<MessageResponse>> {
    let users = UserRepository::new((*state.storage).clone());

    let mut user = users
        .find_active_by_email(&payload.email)
        .await?
        .ok_or_else(|| Error::not_found("No existe ningún usuario con ese email"))?;

    let token = generate_reset_token();
    user.reset_token = Some(token.clone());
    user.reset_token_expires = Some(Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES));
    users.update(user.clone()).await?;

    let template = PasswordResetEmailTemplate { token: &token };
    state
        .email
        .send_email(&user.email, &template.subject(), &template.body_html(), &template.body_text())
        .await?;

    Ok(Json(MessageResponse::new(
        "Token de recuperación generado y enviado por correo electrónico",
    )))
}

/// Reset the password with a recovery token
///
/// PUT /api/user/reset-password (public)
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    validate_password(&payload.new_password)?;

    let users = UserRepository::new((*state.storage).clone());
    let mut user = users
        .find_by_reset_token(&payload.token)
        .await?
        .ok_or_else(|| Error::validation("Token inválido o expirado"))?;

    user.password_hash = hash_password(&payload.new_password)?;
    user.reset_token = None;
    user.reset_token_expires = None;
    users.update(user).await?;

    Ok(Json(MessageResponse::new("Contraseña actualizada correctamente")))
}

/// Shared password policy check
pub(crate) fn validate_password(password: &str) -> std::result::Result<(), Error> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(Error::validation(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
        )));
    }
    Ok(())
}
