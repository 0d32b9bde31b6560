//! Delivery note endpoints: creation, teammate-scoped reads, PDF
//! rendering, the one-way signing workflow, and the signed-note delete
//! lockout.

use albar_core::{
    ClientRepository, DeliveryNoteRepository, IdGenerator, NoteDocument, ProjectRepository,
    UserRepository, can_access, can_access_note,
};
use albar_types::{
    Error,
    entities::{DeliveryNote, NoteEntry, NoteKind, User},
};
use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
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

#[derive(Debug, Deserialize, Serialize)]
pub struct NoteEntryDto {
    pub name: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub client_id: i64,
    pub project_id: i64,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub entries: Vec<NoteEntryDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteResponse {
    pub id: i64,
    pub created_by: i64,
    pub client_id: i64,
    pub project_id: i64,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    pub entries: Vec<NoteEntryDto>,
    pub signed: bool,
    pub signature_url: Option<String>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteEnvelope {
    pub delivery_note: NoteResponse,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesResponse {
    pub delivery_notes: Vec<NoteResponse>,
}

fn note_to_response(note: DeliveryNote) -> NoteResponse {
    NoteResponse {
        id: note.id,
        created_by: note.created_by,
        client_id: note.client_id,
        project_id: note.project_id,
        kind: note.kind,
        entries: note
            .entries
            .into_iter()
            .map(|e| NoteEntryDto {
                name: e.name,
                quantity: e.quantity,
                unit: e.unit,
                description: e.description,
            })
            .collect(),
        signed: note.signed,
        signature_url: note.signature_url,
        created_at: note.created_at.to_rfc3339(),
        deleted_at: note.deleted_at.map(|dt| dt.to_rfc3339()),
    }
}

/// Resolve the note's creator and enforce the teammate predicate
///
/// Returns the creator for further use (PDF rendering needs the name).
/// When the creator account was purged, only the creator-identity half of
/// the predicate can hold, so the caller must be the creator themselves.
async fn require_note_access(
    state: &AppState,
    user: &User,
    note: &DeliveryNote,
) -> Result<User> {
    let users = UserRepository::new((*state.storage).clone());
    match users.get(note.created_by).await? {
        Some(creator) => {
            if !can_access_note(user, &creator, note) {
                return Err(Error::authz("No autorizado").into());
            }
            Ok(creator)
        },
        None => {
            if note.created_by != user.id {
                return Err(Error::authz("No autorizado").into());
            }
            Ok(user.clone())
        },
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new delivery note
///
/// POST /api/deliverynote
///
/// The referenced client and project must exist and be accessible to the
/// caller.
pub async fn create_note(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteEnvelope>)> {
    let user = &session.user;

    let clients = ClientRepository::new((*state.storage).clone());
    let client = clients
        .find_active(payload.client_id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    if !can_access(user, client.created_by, client.company_id.as_deref()) {
        return Err(Error::authz("No autorizado").into());
    }

    let projects = ProjectRepository::new((*state.storage).clone());
    let project = projects
        .find_active(payload.project_id)
        .await?
        .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
    if !can_access(user, project.owner, project.company_id.as_deref()) {
        return Err(Error::authz("No autorizado").into());
    }

    let entries: Vec<NoteEntry> = payload
        .entries
        .into_iter()
        .map(|e| NoteEntry {
            name: e.name,
            quantity: e.quantity,
            unit: e.unit,
            description: e.description,
        })
        .collect();

    let note = DeliveryNote::builder()
        .id(IdGenerator::next_id())
        .created_by(user.id)
        .client_id(payload.client_id)
        .project_id(payload.project_id)
        .kind(payload.kind)
        .entries(entries)
        .create()?;

    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    repo.create(note.clone()).await?;

    Ok((StatusCode::CREATED, Json(NoteEnvelope { delivery_note: note_to_response(note) })))
}

/// List active notes created by the caller or their teammates
///
/// GET /api/deliverynote
pub async fn list_notes(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ListNotesResponse>> {
    let mut creators = vec![session.user.id];
    creators.extend(&session.user.company_users);

    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    let notes = repo.list_active_for(&creators).await?;

    Ok(Json(ListNotesResponse {
        delivery_notes: notes.into_iter().map(note_to_response).collect(),
    }))
}

/// Get one note by ID
///
/// GET /api/deliverynote/:id
///
/// 404 when absent or archived, 403 when the teammate predicate fails.
pub async fn get_note(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<Json<NoteEnvelope>> {
    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    let note = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Albarán no encontrado"))?;
    require_note_access(&state, &session.user, &note).await?;

    Ok(Json(NoteEnvelope { delivery_note: note_to_response(note) }))
}

/// Render a note as PDF
///
/// GET /api/deliverynote/pdf/:id
///
/// Read-only: same predicate as note read, never mutates the note.
/// Archived client/project references still resolve for rendering.
pub async fn generate_pdf(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    let note = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Albarán no encontrado"))?;
    let creator = require_note_access(&state, &session.user, &note).await?;

    let clients = ClientRepository::new((*state.storage).clone());
    let client = clients
        .get(note.client_id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;

    let projects = ProjectRepository::new((*state.storage).clone());
    let project = projects
        .get(note.project_id)
        .await?
        .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;

    let document = NoteDocument::from_note(&note, &creator, &client, &project);
    let bytes = state.pdf.render(&document)?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"albaran-{id}.pdf\""),
        ),
    ];
    Ok((headers, bytes))
}

/// Sign a note with an uploaded image
///
/// PATCH /api/deliverynote/sign/:id (multipart field `image`)
///
/// The image is pinned first; an upload failure fails the whole operation
/// with no state change. Signing is a one-way transition.
pub async fn sign_note(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<NoteEnvelope>> {
    let mut file: Option<(Vec<u8>, String)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Cuerpo multipart no válido: {e}")))?
    {
        if field.name() == Some("image") {
            let filename = field.file_name().unwrap_or("firma").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| Error::validation(format!("Cuerpo multipart no válido: {e}")))?;
            file = Some((data.to_vec(), filename));
        }
    }
    let (bytes, filename) =
        file.ok_or_else(|| Error::validation("No se ha subido ningún archivo"))?;

    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    let mut note = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Albarán no encontrado"))?;
    require_note_access(&state, &session.user, &note).await?;

    if note.signed {
        return Err(Error::validation("El albarán ya está firmado").into());
    }

    let uploaded = state.ipfs.upload(bytes, &filename).await?;
    note.sign(uploaded.url)?;
    repo.update(note.clone()).await?;

    Ok(Json(NoteEnvelope { delivery_note: note_to_response(note) }))
}

/// Archive (default) or permanently delete an unsigned note
///
/// DELETE /api/deliverynote/:id?soft=bool
///
/// Signed notes refuse both paths with 403, for every caller, forever.
pub async fn delete_note(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<MessageResponse>> {
    let repo = DeliveryNoteRepository::new((*state.storage).clone());
    let note = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Albarán no encontrado"))?;
    require_note_access(&state, &session.user, &note).await?;

    if !note.can_be_deleted() {
        return Err(Error::authz("No se puede eliminar un albarán firmado").into());
    }

    if params.is_soft() {
        repo.archive(id).await?;
        Ok(Json(MessageResponse::new("Albarán archivado correctamente")))
    } else {
        repo.purge(id).await?;
        Ok(Json(MessageResponse::new("Albarán eliminado permanentemente")))
    }
}
