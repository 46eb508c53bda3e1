use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sprint {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: Option<DateTime>,
    pub end_date: Option<DateTime>,
    #[serde(default)]
    pub status: SprintStatus,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    #[default]
    Planned,
    Active,
    Completed,
}

impl Sprint {
    pub const COLLECTION: &'static str = "sprints";
}
