use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use workhub_db::models::{OrgRole, OrganizationMember};
use workhub_services::dao::base::PaginationParams;

use super::{hex_id, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub id: String,
    pub user_id: String,
    pub role: OrgRole,
    pub joined_at: String,
    pub invited_by: Option<String>,
}

fn to_response(m: OrganizationMember) -> MemberResponse {
    MemberResponse {
        id: hex_id(m.id),
        user_id: m.user_id.to_hex(),
        role: m.role,
        joined_at: rfc3339(m.joined_at),
        invited_by: m.invited_by.map(|id| id.to_hex()),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: OrgRole,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;

    let result = state
        .organization_service
        .list_members(&auth.principal, org_id, &params)
        .await?;

    let items: Vec<MemberResponse> = result.items.into_iter().map(to_response).collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, user_id)): Path<(String, String)>,
    Json(body): Json<UpdateRoleRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    let member = state
        .organization_service
        .update_member_role(&auth.principal, org_id, user_id, body.role)
        .await?;
    Ok(Json(to_response(member)))
}

pub async fn remove(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    let user_id = parse_id(&user_id, "user_id")?;

    state
        .organization_service
        .remove_member(&auth.principal, org_id, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn leave(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    state
        .organization_service
        .leave(&auth.principal, org_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
