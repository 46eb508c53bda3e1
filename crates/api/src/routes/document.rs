use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;
use workhub_db::models::{DocType, Document};
use workhub_services::{
    AccessMode,
    dao::document::{DocumentChanges, NewDocument},
};

use super::{hex_id, parse_id, parse_optional_id, rfc3339};
use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDocumentRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub doc_type: DocType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub collaborators: Vec<String>,
    #[serde(default)]
    pub is_public: bool,
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDocumentRequest {
    #[validate(length(min = 1, max = 300))]
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub doc_type: Option<DocType>,
    pub tags: Option<Vec<String>>,
    pub collaborators: Option<Vec<String>>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub project_id: Option<String>,
    pub owner_id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub doc_type: DocType,
    pub tags: Vec<String>,
    pub collaborators: Vec<String>,
    pub is_public: bool,
    pub created_at: String,
    pub updated_at: String,
}

fn to_response(d: Document) -> DocumentResponse {
    DocumentResponse {
        id: hex_id(d.id),
        project_id: d.project_id.map(|id| id.to_hex()),
        owner_id: d.owner_id.to_hex(),
        title: d.title,
        content: d.content,
        summary: d.summary,
        doc_type: d.doc_type,
        tags: d.tags,
        collaborators: d.collaborators.iter().map(|id| id.to_hex()).collect(),
        is_public: d.is_public,
        created_at: rfc3339(d.created_at),
        updated_at: rfc3339(d.updated_at),
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentDetailResponse {
    #[serde(flatten)]
    pub document: DocumentResponse,
    pub can_edit: bool,
}

fn parse_ids(values: &[String]) -> Result<Vec<bson::oid::ObjectId>, ApiError> {
    values.iter().map(|v| parse_id(v, "collaborator id")).collect()
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<DocumentResponse>>, ApiError> {
    let organizations = state
        .organizations
        .find_user_organizations(auth.user_id)
        .await?;
    let organization_ids: Vec<_> = organizations.iter().filter_map(|o| o.id).collect();
    let project_ids: Vec<_> = state
        .projects
        .find_visible(auth.user_id, &organization_ids)
        .await?
        .iter()
        .filter_map(|p| p.id)
        .collect();

    let candidates = state
        .documents
        .find_candidates(auth.user_id, &project_ids)
        .await?;

    let mut response = Vec::with_capacity(candidates.len());
    for document in candidates {
        if state
            .access
            .document_visible(&auth.principal, &document)
            .await?
        {
            response.push(to_response(document));
        }
    }
    Ok(Json(response))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), ApiError> {
    body.validate()?;
    let project_id = parse_optional_id(body.project_id.as_deref(), "project_id")?;
    let collaborators = parse_ids(&body.collaborators)?;

    state
        .access
        .authorize_document_creation(&auth.principal, project_id)
        .await?;

    let document = state
        .documents
        .create(
            auth.user_id,
            project_id,
            NewDocument {
                title: body.title,
                content: body.content,
                summary: body.summary,
                doc_type: body.doc_type,
                tags: body.tags,
                collaborators,
                is_public: body.is_public,
            },
        )
        .await?;

    info!(document_id = %hex_id(document.id), owner_id = %auth.user_id, ?project_id, "Document created");
    Ok((StatusCode::CREATED, Json(to_response(document))))
}

pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<String>,
) -> Result<Json<DocumentDetailResponse>, ApiError> {
    let document_id = parse_id(&document_id, "document_id")?;
    let document = state
        .access
        .authorize_document(&auth.principal, document_id, AccessMode::View)
        .await?;
    let can_edit = state
        .access
        .resolve_document_access(&auth.principal, document_id, AccessMode::Edit)
        .await?;

    Ok(Json(DocumentDetailResponse {
        document: to_response(document),
        can_edit,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<String>,
    Json(body): Json<UpdateDocumentRequest>,
) -> Result<Json<DocumentResponse>, ApiError> {
    body.validate()?;
    let document_id = parse_id(&document_id, "document_id")?;
    let collaborators = body.collaborators.as_deref().map(parse_ids).transpose()?;

    state
        .access
        .authorize_document(&auth.principal, document_id, AccessMode::Edit)
        .await?;

    state
        .documents
        .update(
            document_id,
            DocumentChanges {
                title: body.title,
                content: body.content,
                summary: body.summary,
                doc_type: body.doc_type,
                tags: body.tags,
                collaborators,
                is_public: body.is_public,
            },
        )
        .await?;

    let document = state.documents.find(document_id).await?;
    Ok(Json(to_response(document)))
}

pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(document_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let document_id = parse_id(&document_id, "document_id")?;
    state
        .access
        .authorize_document(&auth.principal, document_id, AccessMode::Edit)
        .await?;

    state.documents.delete(document_id).await?;
    info!(%document_id, deleted_by = %auth.user_id, "Document deleted");
    Ok(StatusCode::NO_CONTENT)
}
