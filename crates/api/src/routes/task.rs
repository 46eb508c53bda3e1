use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use workhub_db::models::{Comment, Task, TaskPriority, TaskStatus, TaskType};
use workhub_services::{
    AccessError, AccessMode, TaskDraft,
    dao::{
        base::DaoError,
        task::{NewTask, TaskChanges},
    },
};

use super::{hex_id, parse_date, parse_id, parse_optional_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub task_type: TaskType,
    pub assignee_id: Option<String>,
    pub sprint_id: Option<String>,
    pub epic_id: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub task_type: Option<TaskType>,
    pub assignee_id: Option<String>,
    pub sprint_id: Option<String>,
    pub epic_id: Option<String>,
    pub due_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub sprint_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateTasksRequest {
    #[validate(length(min = 1, max = 4000))]
    pub prompt: String,
    /// Persist the drafts instead of only returning them.
    #[serde(default)]
    pub create: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub content: String,
    pub parent_comment_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub task_type: TaskType,
    pub assignee_id: Option<String>,
    pub reporter_id: Option<String>,
    pub sprint_id: Option<String>,
    pub epic_id: Option<String>,
    pub due_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

fn to_response(t: Task) -> TaskResponse {
    TaskResponse {
        id: hex_id(t.id),
        project_id: t.project_id.to_hex(),
        title: t.title,
        description: t.description,
        status: t.status,
        priority: t.priority,
        task_type: t.task_type,
        assignee_id: t.assignee_id.map(|id| id.to_hex()),
        reporter_id: t.reporter_id.map(|id| id.to_hex()),
        sprint_id: t.sprint_id.map(|id| id.to_hex()),
        epic_id: t.epic_id.map(|id| id.to_hex()),
        due_date: t.due_date.map(rfc3339),
        created_at: rfc3339(t.created_at),
        updated_at: rfc3339(t.updated_at),
    }
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub id: String,
    pub task_id: String,
    pub author_id: String,
    pub content: String,
    pub parent_comment_id: Option<String>,
    pub created_at: String,
}

fn comment_response(c: Comment) -> CommentResponse {
    CommentResponse {
        id: hex_id(c.id),
        task_id: c.task_id.to_hex(),
        author_id: c.author_id.to_hex(),
        content: c.content,
        parent_comment_id: c.parent_comment_id.map(|id| id.to_hex()),
        created_at: rfc3339(c.created_at),
    }
}

#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    #[serde(flatten)]
    pub task: TaskResponse,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct GenerateTasksResponse {
    pub drafts: Vec<TaskDraft>,
    pub created: Vec<TaskResponse>,
}

fn invalid_reference(field: &str) -> impl FnOnce(DaoError) -> ApiError + '_ {
    move |e| match e {
        DaoError::NotFound => ApiError::BadRequest(format!("{field} does not exist")),
        other => other.into(),
    }
}

/// Checks that sprint, epic and assignee references resolve inside the project.
async fn check_references(
    state: &AppState,
    project_id: ObjectId,
    assignee_id: Option<ObjectId>,
    sprint_id: Option<ObjectId>,
    epic_id: Option<ObjectId>,
) -> Result<(), ApiError> {
    if let Some(sprint_id) = sprint_id {
        state
            .sprints
            .find_in_project(project_id, sprint_id)
            .await
            .map_err(invalid_reference("sprint"))?;
    }
    if let Some(epic_id) = epic_id {
        let epic = state
            .tasks
            .find(epic_id)
            .await
            .map_err(invalid_reference("epic"))?;
        if epic.project_id != project_id || epic.task_type != TaskType::Epic {
            return Err(ApiError::BadRequest(
                "epic must be an epic in the same project".to_string(),
            ));
        }
    }
    if let Some(assignee_id) = assignee_id {
        state
            .users
            .find_active(assignee_id)
            .await
            .map_err(invalid_reference("assignee"))?;
    }
    Ok(())
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let project_id = parse_id(&project_id, "project_id")?;
    let sprint_id = parse_optional_id(filter.sprint_id.as_deref(), "sprint_id")?;

    state
        .access
        .authorize_project(&auth.principal, project_id, AccessMode::View)
        .await?;

    let tasks = state
        .tasks
        .find_by_project(project_id, filter.status, sprint_id)
        .await?;
    Ok(Json(tasks.into_iter().map(to_response).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiError> {
    body.validate()?;
    let project_id = parse_id(&project_id, "project_id")?;
    let assignee_id = parse_optional_id(body.assignee_id.as_deref(), "assignee_id")?;
    let sprint_id = parse_optional_id(body.sprint_id.as_deref(), "sprint_id")?;
    let epic_id = parse_optional_id(body.epic_id.as_deref(), "epic_id")?;
    let due_date = parse_date(body.due_date.as_deref(), "due_date")?;

    state
        .access
        .authorize_task_creation(&auth.principal, project_id)
        .await?;
    check_references(&state, project_id, assignee_id, sprint_id, epic_id).await?;

    let task = state
        .tasks
        .create(
            project_id,
            auth.user_id,
            NewTask {
                title: body.title,
                description: body.description,
                status: body.status,
                priority: body.priority,
                task_type: body.task_type,
                assignee_id,
                sprint_id,
                epic_id,
                due_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(to_response(task))))
}

pub async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<GenerateTasksRequest>,
) -> Result<Json<GenerateTasksResponse>, ApiError> {
    body.validate()?;
    let project_id = parse_id(&project_id, "project_id")?;

    let project = state
        .access
        .authorize_task_creation(&auth.principal, project_id)
        .await?;

    let drafts = state
        .task_generator
        .generate(&project.name, &body.prompt)
        .await?;

    let mut created = Vec::new();
    if body.create {
        for draft in &drafts {
            let task = state
                .tasks
                .create(
                    project_id,
                    auth.user_id,
                    NewTask {
                        title: draft.title.clone(),
                        description: draft.description.clone(),
                        priority: draft.priority,
                        task_type: draft.task_type,
                        ..Default::default()
                    },
                )
                .await?;
            created.push(to_response(task));
        }
        info!(%project_id, count = created.len(), "Generated tasks created");
    }

    Ok(Json(GenerateTasksResponse { drafts, created }))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Json<TaskDetailResponse>, ApiError> {
    let task_id = parse_id(&task_id, "task_id")?;
    let (task, _) = state
        .access
        .authorize_task(&auth.principal, task_id, AccessMode::View)
        .await?;

    // A global admin may view tasks of a deleted project but never edit them
    let can_edit = match state
        .access
        .resolve_task_access(&auth.principal, task_id, AccessMode::Edit)
        .await
    {
        Ok(allowed) => allowed,
        Err(AccessError::NotFound(_)) => false,
        Err(e) => return Err(e.into()),
    };

    Ok(Json(TaskDetailResponse {
        task: to_response(task),
        can_edit,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiError> {
    body.validate()?;
    let task_id = parse_id(&task_id, "task_id")?;
    let assignee_id = parse_optional_id(body.assignee_id.as_deref(), "assignee_id")?;
    let sprint_id = parse_optional_id(body.sprint_id.as_deref(), "sprint_id")?;
    let epic_id = parse_optional_id(body.epic_id.as_deref(), "epic_id")?;
    let due_date = parse_date(body.due_date.as_deref(), "due_date")?;

    let (task, _) = state
        .access
        .authorize_task(&auth.principal, task_id, AccessMode::Edit)
        .await?;

    if epic_id == Some(task_id) {
        return Err(ApiError::BadRequest("a task cannot be its own epic".to_string()));
    }
    check_references(&state, task.project_id, assignee_id, sprint_id, epic_id).await?;

    state
        .tasks
        .update(
            task_id,
            TaskChanges {
                title: body.title,
                description: body.description,
                status: body.status,
                priority: body.priority,
                task_type: body.task_type,
                assignee_id,
                sprint_id,
                epic_id,
                due_date,
            },
        )
        .await?;

    let task = state.tasks.find(task_id).await?;
    Ok(Json(to_response(task)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let task_id = parse_id(&task_id, "task_id")?;
    state
        .access
        .authorize_task(&auth.principal, task_id, AccessMode::Edit)
        .await?;

    state.tasks.delete(task_id).await?;
    info!(%task_id, deleted_by = %auth.user_id, "Task removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_comments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
) -> Result<Json<Vec<CommentResponse>>, ApiError> {
    let task_id = parse_id(&task_id, "task_id")?;
    state
        .access
        .authorize_task(&auth.principal, task_id, AccessMode::View)
        .await?;

    let comments = state.comments.find_by_task(task_id).await?;
    Ok(Json(comments.into_iter().map(comment_response).collect()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    body.validate()?;
    let task_id = parse_id(&task_id, "task_id")?;
    let parent_comment_id =
        parse_optional_id(body.parent_comment_id.as_deref(), "parent_comment_id")?;

    // Anyone who can see the task may discuss it
    state
        .access
        .authorize_task(&auth.principal, task_id, AccessMode::View)
        .await?;

    let comment = state
        .comments
        .create(task_id, auth.user_id, body.content, parent_comment_id)
        .await
        .map_err(invalid_reference("parent comment"))?;

    Ok((StatusCode::CREATED, Json(comment_response(comment))))
}
