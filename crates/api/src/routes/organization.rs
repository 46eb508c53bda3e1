use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workhub_db::models::{OrgRole, Organization, OrganizationSettings};

use super::{hex_id, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub settings: OrganizationSettings,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub settings: Option<OrganizationSettings>,
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub settings: OrganizationSettings,
    pub created_by: String,
    pub created_at: String,
    /// The caller's role, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<OrgRole>,
}

pub(crate) fn to_response(org: Organization, role: Option<OrgRole>) -> OrganizationResponse {
    OrganizationResponse {
        id: hex_id(org.id),
        name: org.name,
        description: org.description,
        settings: org.settings,
        created_by: org.created_by.to_hex(),
        created_at: rfc3339(org.created_at),
        role,
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<OrganizationResponse>>, ApiError> {
    let organizations = state.organization_service.list_for(&auth.principal).await?;
    Ok(Json(
        organizations
            .into_iter()
            .map(|o| to_response(o, None))
            .collect(),
    ))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), ApiError> {
    body.validate()?;

    let organization = state
        .organization_service
        .create(&auth.principal, body.name, body.description, body.settings)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(to_response(organization, Some(OrgRole::Owner))),
    ))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    let (organization, role) = state
        .organization_service
        .get(&auth.principal, org_id)
        .await?;
    Ok(Json(to_response(organization, Some(role))))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
    Json(body): Json<UpdateOrganizationRequest>,
) -> Result<Json<OrganizationResponse>, ApiError> {
    body.validate()?;
    let org_id = parse_id(&org_id, "org_id")?;

    let organization = state
        .organization_service
        .update(
            &auth.principal,
            org_id,
            body.name,
            body.description,
            body.settings,
        )
        .await?;
    Ok(Json(to_response(organization, Some(OrgRole::Owner))))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    state
        .organization_service
        .delete(&auth.principal, org_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
