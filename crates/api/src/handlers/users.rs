//! Authenticated account endpoints: verification, profile, onboarding,
//! company data, logo upload, password change, lifecycle and invitations.

use albar_core::{
    IdGenerator, InvitationEmailTemplate, UserRepository, email::EmailTemplate,
    generate_temp_password, generate_verification_code, hash_password, verify_password,
};
use albar_types::{
    Error,
    entities::{CompanyData, PersonalData, User, UserRole, UserStatus},
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{
    DeleteParams, MessageResponse,
    auth::{AppState, Result, validate_password},
};
use crate::middleware::SessionContext;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ValidateEmailRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDataDto {
    pub name: String,
    pub surname: String,
    pub nif: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDataDto {
    pub name: String,
    pub cif: String,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub role: String,
    pub status: UserStatus,
    pub autonomo: bool,
    pub personal_data: Option<PersonalDataDto>,
    pub company_data: Option<CompanyDataDto>,
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: UserProfile,
}

#[derive(Debug, Deserialize)]
pub struct OnboardingRequest {
    pub name: String,
    pub surname: String,
    pub nif: String,
    pub autonomo: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CompanyRequest {
    pub name: Option<String>,
    pub cif: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoResponse {
    pub message: String,
    pub logo_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
}

fn user_to_profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        status: user.status,
        autonomo: user.autonomo,
        personal_data: user.personal.as_ref().map(|p| PersonalDataDto {
            name: p.name.clone(),
            surname: p.surname.clone(),
            nif: p.nif.clone(),
        }),
        company_data: user.company.as_ref().map(|c| CompanyDataDto {
            name: c.name.clone(),
            cif: c.cif.clone(),
            address: c.address.clone(),
        }),
        logo_url: user.logo_url.clone(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Validate the account email with the mailed code
///
/// PUT /api/user/validation
///
/// A disabled account answers 404. A wrong code burns an attempt; the
/// third strike disables the account.
pub async fn validate_email(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<ValidateEmailRequest>,
) -> Result<Json<MessageResponse>> {
    let users = UserRepository::new((*state.storage).clone());
    let mut user = session.user;

    if user.status == UserStatus::Disabled {
        return Err(Error::not_found("Usuario no encontrado").into());
    }

    if user.verification_code != payload.code {
        let updated = users
            .record_failed_verification(user.id)
            .await?
            .ok_or_else(|| Error::not_found("Usuario no encontrado"))?;
        if updated.status == UserStatus::Disabled {
            return Err(Error::authz(
                "Cuenta deshabilitada por demasiados intentos fallidos.",
            )
            .into());
        }
        return Err(Error::validation(format!(
            "Código incorrecto. Intentos restantes: {}",
            updated.verification_attempts
        ))
        .into());
    }

    user.mark_verified();
    users.update(user).await?;

    Ok(Json(MessageResponse::new("Email validado correctamente")))
}

/// Current account profile
///
/// GET /api/user/me
pub async fn get_current_user(session: SessionContext) -> Result<Json<ProfileResponse>> {
    Ok(Json(ProfileResponse { user: user_to_profile(&session.user) }))
}

/// Store personal onboarding data
///
/// PUT /api/user/register (authenticated)
pub async fn update_onboarding(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<OnboardingRequest>,
) -> Result<Json<MessageResponse>> {
    if payload.name.trim().is_empty()
        || payload.surname.trim().is_empty()
        || payload.nif.trim().is_empty()
    {
        return Err(Error::validation("Nombre, apellidos y NIF son obligatorios").into());
    }

    let users = UserRepository::new((*state.storage).clone());
    let mut user = session.user;
    user.personal = Some(PersonalData {
        name: payload.name,
        surname: payload.surname,
        nif: payload.nif,
    });
    if let Some(autonomo) = payload.autonomo {
        user.autonomo = autonomo;
    }
    users.update(user).await?;

    Ok(Json(MessageResponse::new("Datos personales actualizados correctamente")))
}

/// Update company data
///
/// PATCH /api/user/company
///
/// For a self-employed (`autonomo`) user the company block derives from
/// the personal data; otherwise name, cif and address come from the body.
pub async fn update_company(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CompanyRequest>,
) -> Result<Json<MessageResponse>> {
    let users = UserRepository::new((*state.storage).clone());
    let mut user = session.user;

    let company = if user.autonomo {
        let personal = user
            .personal
            .as_ref()
            .ok_or_else(|| Error::validation("Faltan los datos personales del autónomo"))?;
        CompanyData {
            name: format!("{} {}", personal.name, personal.surname),
            cif: personal.nif.clone(),
            address: payload.address,
        }
    } else {
        let name = payload
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::validation("El nombre de la empresa es obligatorio"))?;
        let cif = payload
            .cif
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| Error::validation("El CIF de la empresa es obligatorio"))?;
        let address = payload
            .address
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| Error::validation("La dirección de la empresa es obligatoria"))?;
        CompanyData { name, cif, address: Some(address) }
    };

    user.company = Some(company);
    users.update(user).await?;

    Ok(Json(MessageResponse::new("Datos de la compañía actualizados correctamente")))
}

/// Upload the company logo
///
/// PATCH /api/user/logo (multipart field `logo`)
pub async fn update_logo(
    State(state): State<AppState>,
    session: SessionContext,
    mut multipart: Multipart,
) -> Result<Json<LogoResponse>> {
    let mut file: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Cuerpo multipart no válido: {e}")))?
    {
        if field.name() == Some("logo") {
            let filename = field.file_name().unwrap_or("logo").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::validation(format!("Cuerpo multipart no válido: {e}")))?;
            file = Some((data.to_vec(), filename));
        }
    }
    let (bytes, filename) =
        file.ok_or_else(|| Error::validation("No se ha subido ningún archivo"))?;

    let uploaded = state.ipfs.upload(bytes, &filename).await?;

    let users = UserRepository::new((*state.storage).clone());
    let mut user = session.user;
    user.logo_url = Some(uploaded.url.clone());
    users.update(user).await?;

    Ok(Json(LogoResponse {
        message: "Logo subido a IPFS correctamente".to_string(),
        logo_url: uploaded.url,
    }))
}

/// Change the password, proving knowledge of the current one
///
/// PATCH /api/user/password
pub async fn change_password(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let mut user = session.user;

    if !verify_password(&payload.current_password, &user.password_hash)? {
        return Err(Error::auth("La contraseña actual no es correcta").into());
    }
    validate_password(&payload.new_password)?;

    user.password_hash = hash_password(&payload.new_password)?;
    let users = UserRepository::new((*state.storage).clone());
    users.update(user).await?;

    Ok(Json(MessageResponse::new("Contraseña actualizada correctamente")))
}

/// Archive or permanently delete the account
///
/// DELETE /api/user?soft=bool (default soft)
pub async fn delete_user(
    State(state): State<AppState>,
    session: SessionContext,
    Query(params): Query<DeleteParams>,
) -> Result<Json<MessageResponse>> {
    let users = UserRepository::new((*state.storage).clone());

    if params.is_soft() {
        users.archive(session.user.id).await?;
        Ok(Json(MessageResponse::new("Usuario deshabilitado correctamente")))
    } else {
        users.purge(session.user.id).await?;
        Ok(Json(MessageResponse::new("Usuario eliminado permanentemente")))
    }
}

/// Restore the archived account
///
/// PUT /api/user/restore
///
/// Reached through the archived-inclusive session path; resets the login
/// counter and re-verifies the account.
pub async fn restore_user(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<MessageResponse>> {
    if !session.user.is_deleted() {
        return Err(Error::validation("El usuario no está archivado").into());
    }

    let users = UserRepository::new((*state.storage).clone());
    users.restore(session.user.id).await?;

    Ok(Json(MessageResponse::new("Usuario restaurado correctamente")))
}

/// Invite a teammate into the company
///
/// POST /api/user/invite
///
/// Creates a pending guest account with temporary credentials, copies the
/// inviter's company data, and links the two teammate lists symmetrically
/// so delivery notes become mutually visible.
pub async fn invite_user(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<InviteRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    User::validate_email(&payload.email)?;

    let users = UserRepository::new((*state.storage).clone());
    if users.get_by_email(&payload.email).await?.is_some() {
        return Err(Error::already_exists("Ese correo ya está registrado").into());
    }

    let mut inviter = session.user;
    if inviter.is_deleted() || inviter.status != UserStatus::Verified {
        return Err(Error::authz("No autorizado para invitar").into());
    }

    let code = generate_verification_code();
    let temp_password = generate_temp_password();

    let invited = User::builder()
        .id(IdGenerator::next_id())
        .email(payload.email.clone())
        .password_hash(hash_password(&temp_password)?)
        .verification_code(code.clone())
        .role(UserRole::Guest)
        .maybe_company(inviter.company.clone())
        .company_users(vec![inviter.id])
        .create()?;
    users.create(invited.clone()).await?;

    inviter.company_users.push(invited.id);
    users.update(inviter.clone()).await?;

    let template = InvitationEmailTemplate {
        inviter_email: &inviter.email,
        email: &payload.email,
        temp_password: &temp_password,
        code: &code,
    };
    state
        .email
        .send_email(
            &payload.email,
            &template.subject(),
            &template.body_html(),
            &template.body_text(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(format!("Invitación enviada a {}", payload.email))),
    ))
}
