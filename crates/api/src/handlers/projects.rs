//! Project endpoints: ownership-scoped CRUD over a client reference, with
//! archive, restore and hard delete.

use albar_core::{ClientRepository, IdGenerator, ProjectRepository, can_access};
use albar_types::{
    Error,
    entities::{Project, User, UserStatus},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;
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
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    /// Client ID the project belongs to
    pub client: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub client: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub client_id: i64,
    pub owner: i64,
    pub company_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectEnvelope {
    pub message: String,
    pub project: ProjectResponse,
}

#[derive(Debug, Serialize)]
pub struct GetProjectResponse {
    pub project: ProjectResponse,
}

#[derive(Debug, Serialize)]
pub struct ListProjectsResponse {
    pub projects: Vec<ProjectResponse>,
}

fn project_to_response(project: Project) -> ProjectResponse {
    ProjectResponse {
        id: project.id,
        name: project.name,
        description: project.description,
        client_id: project.client_id,
        owner: project.owner,
        company_id: project.company_id,
        start_date: project.start_date,
        end_date: project.end_date,
        created_at: project.created_at.to_rfc3339(),
        deleted_at: project.deleted_at.map(|dt| dt.to_rfc3339()),
    }
}

/// Enforce the shared ownership predicate, 403 on failure
fn require_access(user: &User, project: &Project) -> Result<()> {
    if !can_access(user, project.owner, project.company_id.as_deref()) {
        return Err(Error::authz("No autorizado").into());
    }
    Ok(())
}

/// The referenced client must exist and be accessible to the caller
async fn require_client(state: &AppState, user: &User, client_id: i64) -> Result<()> {
    let clients = ClientRepository::new((*state.storage).clone());
    let client = clients
        .find_active(client_id)
        .await?
        .ok_or_else(|| Error::not_found("Cliente no encontrado"))?;
    if !can_access(user, client.created_by, client.company_id.as_deref()) {
        return Err(Error::authz("No autorizado").into());
    }
    Ok(())
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new project
///
/// POST /api/project
///
/// The (name, client, owner) triple must be unused among active projects.
pub async fn create_project(
    State(state): State<AppState>,
    session: SessionContext,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<GetProjectResponse>)> {
    let user = &session.user;
    if user.status != UserStatus::Verified {
        return Err(Error::authz("Cuenta no verificada").into());
    }
    require_client(&state, user, payload.client).await?;

    let project = Project::builder()
        .id(IdGenerator::next_id())
        .name(payload.name)
        .maybe_description(payload.description)
        .client_id(payload.client)
        .owner(user.id)
        .maybe_company_id(user.company_cif().map(str::to_string))
        .maybe_start_date(payload.start_date)
        .maybe_end_date(payload.end_date)
        .create()?;

    let repo = ProjectRepository::new((*state.storage).clone());
    repo.create(project.clone()).await?;

    Ok((
        StatusCode::CREATED,
        Json(GetProjectResponse { project: project_to_response(project) }),
    ))
}

/// Update a project
///
/// PUT /api/project/:id
pub async fn update_project(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectEnvelope>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let mut project = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
    require_access(&session.user, &project)?;

    if let Some(name) = payload.name {
        Project::validate_name(&name)?;
        project.name = name;
    }
    if let Some(description) = payload.description {
        project.description = Some(description);
    }
    if let Some(client_id) = payload.client {
        if client_id != project.client_id {
            require_client(&state, &session.user, client_id).await?;
        }
        project.client_id = client_id;
    }
    if let Some(start) = payload.start_date {
        project.start_date = Some(start);
    }
    if let Some(end) = payload.end_date {
        project.end_date = Some(end);
    }
    if let (Some(start), Some(end)) = (project.start_date, project.end_date) {
        if end < start {
            return Err(Error::validation(
                "La fecha de fin no puede ser anterior a la de inicio",
            )
            .into());
        }
    }

    repo.update(project.clone()).await?;

    Ok(Json(ProjectEnvelope {
        message: "Proyecto actualizado correctamente".to_string(),
        project: project_to_response(project),
    }))
}

/// List active projects visible to the caller (own plus company)
///
/// GET /api/project
pub async fn list_projects(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ListProjectsResponse>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let projects = repo.list_active_for(&session.user).await?;

    Ok(Json(ListProjectsResponse {
        projects: projects.into_iter().map(project_to_response).collect(),
    }))
}

/// List archived projects visible to the caller
///
/// GET /api/project/archived
pub async fn list_archived_projects(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<Json<ListProjectsResponse>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let projects = repo.list_archived_for(&session.user).await?;

    Ok(Json(ListProjectsResponse {
        projects: projects.into_iter().map(project_to_response).collect(),
    }))
}

/// Get one project by ID
///
/// GET /api/project/:id
///
/// 404 when absent or archived, 403 when present but owned elsewhere.
pub async fn get_project(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<Json<GetProjectResponse>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let project = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
    require_access(&session.user, &project)?;

    Ok(Json(GetProjectResponse { project: project_to_response(project) }))
}

/// Archive (default) or permanently delete a project
///
/// DELETE /api/project/:id?soft=bool
pub async fn delete_project(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<MessageResponse>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let project = repo
        .find_active(id)
        .await?
        .ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
    require_access(&session.user, &project)?;

    if params.is_soft() {
        repo.archive(id).await?;
        Ok(Json(MessageResponse::new("Proyecto archivado correctamente")))
    } else {
        repo.purge(id).await?;
        Ok(Json(MessageResponse::new("Proyecto eliminado permanentemente")))
    }
}

/// Restore an archived project
///
/// PUT /api/project/restore/:id
///
/// Re-evaluates ownership against the archived record and re-checks the
/// name triple, which may have been taken meanwhile.
pub async fn restore_project(
    State(state): State<AppState>,
    session: SessionContext,
    Path(id): Path<i64>,
) -> Result<Json<ProjectEnvelope>> {
    let repo = ProjectRepository::new((*state.storage).clone());
    let project =
        repo.get(id).await?.ok_or_else(|| Error::not_found("Proyecto no encontrado"))?;
    require_access(&session.user, &project)?;

    if !project.is_deleted() {
        return Err(Error::validation("El proyecto no está archivado").into());
    }

    let restored = repo.restore(id).await?;

    Ok(Json(ProjectEnvelope {
        message: "Proyecto restaurado correctamente".to_string(),
        project: project_to_response(restored),
    }))
}
