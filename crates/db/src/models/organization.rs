use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub settings: OrganizationSettings,
    pub created_by: ObjectId,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrganizationSettings {
    /// Lets plain members send invitations, not only owners and admins.
    #[serde(default)]
    pub allow_member_invite: bool,
    #[serde(default)]
    pub require_approval: bool,
}

impl Organization {
    pub const COLLECTION: &'static str = "organizations";
}
