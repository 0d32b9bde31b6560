//! Client record endpoints: ownership-scoped CRUD with archive, restore
//! and hard delete.

use albar_core::{ClientRepository, IdGenerator, can_access};
use albar_types::{
    Error,
    entities::{Client, User, UserStatus},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{
    DeleteParams, MessageResponse,
    auth::{AppState, Result},
};
use crate::middleware::SessionContext;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    pub name: String,
    pub cif: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    pub name: String,
    pub cif: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    pub id: i64,
    pub name: String,
    pub cif: String,
    pub address: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub created_by: i64,
    pub company_id: Option<String>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClientEnvelope {
    pub message: String,
    pub client: ClientResponse,
}

#[derive(Debug, Serialize)]
pub struct GetClientResponse {
    pub client: ClientResponse,
}

#[derive(Debug, Serialize)]
pub struct ListClientsResponse {
    pub clients: Vec<ClientResponse>,
}

fn client_to_response(client: Client) -> ClientResponse {
    ClientResponse {
        id: client.id,
        name: client.name,
        cif: client.cif,
        address: client.address,
        contact_email: client.contact_email,
        contact_phone: client.contact_phone,
        created_by: client.created_by,
        company_id: client.company_id,
        created_at: client.created_at.to_rfc3339(),
        deleted_at: client.deleted_at.map(|dt| dt.to_rfc3339()),
    }
}

/// Enforce the shared ownership predicate, 403 on failure
fn require_access(user: &User, client: &Client) -> Result<()> {
    if !can_access(user, client.created_by, client.company_id.as_deref()) {
        return Err(Error::authz("No autorizado").into());
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new client
///
/// POST /api/client
///
/// Requires a verified account. The cif must be unused by this user and
/// their company; unrelated users may repeat it.
pub async fn create_client(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientEnvelope>)> {
    let user = &session.user;
    if user.status != UserStatus::Verified {
        return Err(Error::authz("Cuenta no verificada").into());
    }

    let client = Client::builder()
        .id(IdGenerator::next_id())
        .name(payload.name)
        .cif(payload.cif)
        .maybe_address(payload.address)
        .maybe_contact_email(payload.contact_email)
        .maybe_contact_phone(payload.contact_phone)
        .created_by(user.id)
        .maybe_company_id(user.company_cif().map(str::to_string))
        .create()?;

    let repo = ClientRepository::new((*state.storage).clone());
    repo.create(client.clone()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ClientEnvelope {
            message: "Cliente creado correctamente".to_string(),
            client: client_to_response(client),
        }),
    ))
}

/// Update a client
///
/// PUT /api/client/:id
pub async fn update_client(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateClientRequest>,
) -> Result<Json<ClientEnvelope>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let mut client = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    require_access(&session.user, &client)?;

    Client::validate_name(&payload.name)?;
    Client::validate_cif(&payload.cif)?;
    if let Some(email) = &payload.contact_email {
        User::validate_email(email)?;
    }

    client.name = payload.name;
    client.cif = payload.cif;
    client.address = payload.address;
    client.contact_email = payload.contact_email;
    client.contact_phone = payload.contact_phone;
    repo.update(client.clone()).await?;

    Ok(Json(ClientEnvelope {
        message: "Cliente actualizado correctamente".to_string(),
        client: client_to_response(client),
    }))
}

/// List active clients visible to the caller (own plus company)
///
/// GET /api/client
pub async fn list_clients(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ListClientsResponse>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let clients = repo.list_active_for(&session.user).await?;

    Ok(Json(ListClientsResponse {
        clients: clients.into_iter().map(client_to_response).collect(),
    }))
}

/// List archived clients visible to the caller
///
/// GET /api/client/archived
pub async fn list_archived_clients(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ListClientsResponse>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let clients = repo.list_archived_for(&session.user).await?;

    Ok(Json(ListClientsResponse {
        clients: clients.into_iter().map(client_to_response).collect(),
    }))
}

/// Get one client by ID
///
/// GET /api/client/:id
///
/// 404 when absent or archived, 403 when present but owned elsewhere.
pub async fn get_client(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<Json<GetClientResponse>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let client = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    require_access(&session.user, &client)?;

    Ok(Json(GetClientResponse { client: client_to_response(client) }))
}

/// Archive (default) or permanently delete a client
///
/// DELETE /api/client/:id?soft=bool
pub async fn delete_client(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<MessageResponse>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let client = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    require_access(&session.user, &client)?;

    if params.is_soft() {
        repo.archive(id).await?;
        Ok(Json(MessageResponse::new("Cliente archivado correctamente")))
    } else {
        repo.purge(id).await?;
        Ok(Json(MessageResponse::new("Cliente eliminado permanentemente")))
    }
}

/// Restore an archived client
///
/// PUT /api/client/restore/:id
///
/// The ownership predicate is re-evaluated against the archived record.
pub async fn restore_client(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<Json<ClientEnvelope>> {
    let repo = ClientRepository::new((*state.storage).clone());
    let client =
        repo.get(id).await?.ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    require_access(&session.user, &client)?;

    if !client.is_deleted() {
        return Err(Error::validation("El cliente no está archivado").into());
    }

    let restored = repo.restore(id).await?;

    Ok(Json(ClientEnvelope {
        message: "Cliente restaurado correctamente".to_string(),
        client: client_to_response(restored),
    }))
}
