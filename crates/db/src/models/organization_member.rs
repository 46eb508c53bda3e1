use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::OrgRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    pub user_id: ObjectId,
    pub role: OrgRole,
    pub joined_at: DateTime,
    pub invited_by: Option<ObjectId>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl OrganizationMember {
    pub const COLLECTION: &'static str = "organization_members";
}
