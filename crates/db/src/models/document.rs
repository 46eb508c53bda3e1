use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// A workspace page. Named after the product concept; not to be confused
/// with `bson::Document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: Option<ObjectId>,
    pub owner_id: ObjectId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub summary: Option<String>,
    #[serde(default)]
    pub doc_type: DocType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub collaborators: Vec<ObjectId>,
    #[serde(default)]
    pub is_public: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    #[default]
    Note,
    Spec,
    Meeting,
    Wiki,
    Other,
}

impl Document {
    pub const COLLECTION: &'static str = "documents";

    pub fn is_owned_by(&self, user_id: ObjectId) -> bool {
        self.owner_id == user_id
    }

    pub fn has_collaborator(&self, user_id: ObjectId) -> bool {
        self.collaborators.contains(&user_id)
    }
}
