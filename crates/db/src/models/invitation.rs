use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

use super::role::OrgRole;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationInvitation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization_id: ObjectId,
    /// Lowercased at creation.
    pub email: String,
    pub role: OrgRole,
    pub token: String,
    pub invited_by: ObjectId,
    #[serde(default)]
    pub status: InvitationStatus,
    pub expires_at: DateTime,
    pub accepted_by: Option<ObjectId>,
    pub accepted_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Expired => "expired",
        }
    }
}

impl OrganizationInvitation {
    pub const COLLECTION: &'static str = "organization_invitations";

    pub fn is_past_expiry(&self, now: DateTime) -> bool {
        now > self.expires_at
    }
}
