use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workhub_db::models::{InvitationStatus, OrgRole, OrganizationInvitation};
use workhub_services::invitation::InvitationDetails;

use super::{hex_id, organization, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvitationRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_role")]
    pub role: OrgRole,
}

fn default_role() -> OrgRole {
    OrgRole::Member
}

#[derive(Debug, Serialize)]
pub struct InvitationResponse {
    pub id: String,
    pub organization_id: String,
    pub email: String,
    pub role: OrgRole,
    pub status: InvitationStatus,
    pub invited_by: String,
    pub expires_at: String,
    pub created_at: String,
}

fn to_response(inv: OrganizationInvitation) -> InvitationResponse {
    InvitationResponse {
        id: hex_id(inv.id),
        organization_id: inv.organization_id.to_hex(),
        email: inv.email,
        role: inv.role,
        status: inv.status,
        invited_by: inv.invited_by.to_hex(),
        expires_at: rfc3339(inv.expires_at),
        created_at: rfc3339(inv.created_at),
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedInvitationResponse {
    pub invitation: InvitationResponse,
    /// Always returned so the inviter can share it by hand.
    pub invite_link: String,
    pub token: String,
    pub email_sent: bool,
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
) -> Result<Json<Vec<InvitationResponse>>, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    let invitations = state.invitations.list(&auth.principal, org_id).await?;
    Ok(Json(invitations.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(org_id): Path<String>,
    Json(body): Json<CreateInvitationRequest>,
) -> Result<(StatusCode, Json<CreatedInvitationResponse>), ApiError> {
    body.validate()?;
    let org_id = parse_id(&org_id, "org_id")?;

    let created = state
        .invitations
        .create_invitation(&auth.principal, org_id, &body.email, body.role)
        .await?;

    let token = created.invitation.token.clone();
    Ok((
        StatusCode::CREATED,
        Json(CreatedInvitationResponse {
            invitation: to_response(created.invitation),
            invite_link: created.invite_link,
            token,
            email_sent: created.email_sent,
        }),
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((org_id, invitation_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let org_id = parse_id(&org_id, "org_id")?;
    let invitation_id = parse_id(&invitation_id, "invitation_id")?;

    state
        .invitations
        .cancel(&auth.principal, org_id, invitation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public: no authentication.
pub async fn details(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<InvitationDetails>, ApiError> {
    Ok(Json(state.invitations.details(&token).await?))
}

pub async fn accept(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(token): Path<String>,
) -> Result<Json<organization::OrganizationResponse>, ApiError> {
    let organization = state.invitations.accept(&token, &auth.principal).await?;
    Ok(Json(organization::to_response(organization, None)))
}
