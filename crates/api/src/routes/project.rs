use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use workhub_db::models::Project;
use workhub_services::{AccessMode, ProjectAccess, access::rules};

use super::{hex_id, parse_id, parse_optional_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectMemberRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    pub organization_id: Option<String>,
    pub members: Vec<String>,
    pub deleted: bool,
    pub created_at: String,
    pub updated_at: String,
    /// `owner` when the caller may edit and delete, otherwise `view`.
    pub access: &'static str,
}

fn access_label(access: ProjectAccess) -> &'static str {
    if access.can_manage() { "owner" } else { "view" }
}

fn to_response(p: Project, access: ProjectAccess) -> ProjectResponse {
    ProjectResponse {
        id: hex_id(p.id),
        deleted: p.is_deleted(),
        name: p.name,
        description: p.description,
        owner_id: p.owner_id.to_hex(),
        organization_id: p.organization_id.map(|id| id.to_hex()),
        members: p.members.iter().map(|id| id.to_hex()).collect(),
        created_at: rfc3339(p.created_at),
        updated_at: rfc3339(p.updated_at),
        access: access_label(access),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let organizations = state
        .organizations
        .find_user_organizations(auth.user_id)
        .await?;
    let organization_ids: Vec<_> = organizations.iter().filter_map(|o| o.id).collect();

    let projects = state
        .projects
        .find_visible(auth.user_id, &organization_ids)
        .await?;

    let mut response = Vec::with_capacity(projects.len());
    for project in projects {
        let role = match project.organization_id {
            Some(org_id) => state.access.resolve_org_role(auth.user_id, org_id).await?,
            None => None,
        };
        let access = rules::project_access(&auth.principal, &project, role);
        if access.can_view() {
            response.push(to_response(project, access));
        }
    }

    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    body.validate()?;
    let organization_id = parse_optional_id(body.organization_id.as_deref(), "organization_id")?;
    let members = body
        .members
        .iter()
        .map(|m| parse_id(m, "member id"))
        .collect::<Result<Vec<_>, _>>()?;

    state
        .access
        .authorize_project_creation(&auth.principal, organization_id)
        .await?;

    let project = state
        .projects
        .create(
            body.name,
            body.description,
            auth.user_id,
            organization_id,
            members,
        )
        .await?;

    info!(project_id = %hex_id(project.id), owner_id = %auth.user_id, ?organization_id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(to_response(project, ProjectAccess::Owner)),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    let access = state
        .access
        .resolve_project_access(&auth.principal, project_id)
        .await?;
    access.require(AccessMode::View)?;

    let project = state.projects.find_any(project_id).await?;
    Ok(Json(to_response(project, access)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    body.validate()?;
    let project_id = parse_id(&project_id, "project_id")?;

    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::Edit)
        .await?;

    state
        .projects
        .update(project_id, body.name, body.description)
        .await?;

    let project = state.projects.find_active(project_id).await?;
    Ok(Json(to_response(project, ProjectAccess::Owner)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;

    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::Edit)
        .await?;

    state.projects.soft_delete(project_id).await?;
    info!(%project_id, deleted_by = %auth.user_id, "Project soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<ProjectMemberRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    let user_id = parse_id(&body.user_id, "user_id")?;

    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::Edit)
        .await?;

    state.users.find_active(user_id).await.map_err(|_| {
        ApiError::BadRequest("user does not exist".to_string())
    })?;

    state.projects.add_member(project_id, user_id).await?;
    let project = state.projects.find_active(project_id).await?;
    Ok(Json(to_response(project, ProjectAccess::Owner)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(String, String)>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::Edit)
        .await?;

    state.projects.remove_member(project_id, user_id).await?;
    let project = state.projects.find_active(project_id).await?;
    Ok(Json(to_response(project, ProjectAccess::Owner)))
}
