use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workhub_db::models::{Sprint, SprintStatus};
use workhub_services::AccessMode;

use super::{hex_id, parse_date, parse_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSprintRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SprintResponse {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: SprintStatus,
    pub created_at: String,
}

fn to_response(s: Sprint) -> SprintResponse {
    SprintResponse {
        id: hex_id(s.id),
        project_id: s.project_id.to_hex(),
        name: s.name,
        goal: s.goal,
        start_date: s.start_date.map(rfc3339),
        end_date: s.end_date.map(rfc3339),
        status: s.status,
        created_at: rfc3339(s.created_at),
    }
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<Vec<SprintResponse>>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::View)
        .await?;

    let sprints = state.sprints.find_by_project(project_id).await?;
    Ok(Json(sprints.into_iter().map(to_response).collect()))
}

/// Sprints follow the task editing rule.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateSprintRequest>,
) -> Result<(StatusCode, Json<SprintResponse>), ApiError> {
    body.validate()?;
    let project_id = parse_id(&project_id, "project_id")?;
    let start_date = parse_date(body.start_date.as_deref(), "start_date")?;
    let end_date = parse_date(body.end_date.as_deref(), "end_date")?;
    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end < start {
            return Err(ApiError::BadRequest(
                "end_date must not be before start_date".to_string(),
            ));
        }
    }

    state
        .access
        .authorize_task_creation(&auth.principal, project_id)
        .await?;

    let sprint = state
        .sprints
        .create(
            project_id,
            body.name,
            body.goal,
            start_date,
            end_date,
            auth.user_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(to_response(sprint))))
}

/// Returns the tasks moved back to the backlog.
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((project_id, sprint_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    let sprint_id = parse_id(&sprint_id, "sprint_id")?;

    state
        .access
        .authorize_task_creation(&auth.principal, project_id)
        .await?;

    let detached = state.sprints.delete(project_id, sprint_id).await?;
    Ok(Json(serde_json::json!({ "detached_tasks": detached })))
}
