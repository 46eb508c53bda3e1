use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: ObjectId,
    pub organization_id: Option<ObjectId>,
    #[serde(default)]
    pub members: Vec<ObjectId>,
    #[serde(rename = "deleted_at", default)]
    pub state: ProjectState,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Lifecycle of a project. Persisted as the nullable `deleted_at` field so
/// `{ "deleted_at": null }` filters keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectState {
    #[default]
    Active,
    Deleted { at: DateTime },
}

impl Serialize for ProjectState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProjectState::Active => serializer.serialize_none(),
            ProjectState::Deleted { at } => serializer.serialize_some(at),
        }
    }
}

impl<'de> Deserialize<'de> for ProjectState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let deleted_at = Option::<DateTime>::deserialize(deserializer)?;
        Ok(match deleted_at {
            Some(at) => ProjectState::Deleted { at },
            None => ProjectState::Active,
        })
    }
}

impl Project {
    pub const COLLECTION: &'static str = "projects";

    pub fn is_deleted(&self) -> bool {
        matches!(self.state, ProjectState::Deleted { .. })
    }

    pub fn is_owned_by(&self, user_id: ObjectId) -> bool {
        self.owner_id == user_id
    }

    pub fn has_member(&self, user_id: ObjectId) -> bool {
        self.members.contains(&user_id)
    }
}
