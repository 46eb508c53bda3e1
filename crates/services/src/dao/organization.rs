use bson::{doc, oid::ObjectId, DateTime};
use mongodb::Database;
use tracing::{info, warn};
use workhub_db::models::{
    InvitationStatus, OrgRole, Organization, OrganizationInvitation, OrganizationMember,
    OrganizationSettings, Project,
};

use super::base::{
    BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams, Transactions,
    inserted_object_id, map_write_error,
};

pub struct OrganizationDao {
    pub base: BaseDao<Organization>,
    pub members: BaseDao<OrganizationMember>,
    pub invitations: BaseDao<OrganizationInvitation>,
    projects: BaseDao<Project>,
    tx: Transactions,
}

impl OrganizationDao {
    pub fn new(db: &Database, tx: Transactions) -> Self {
        Self {
            base: BaseDao::new(db, Organization::COLLECTION),
            members: BaseDao::new(db, OrganizationMember::COLLECTION),
            invitations: BaseDao::new(db, OrganizationInvitation::COLLECTION),
            projects: BaseDao::new(db, Project::COLLECTION),
            tx,
        }
    }

    /// Inserts the organization and its sole OWNER membership together.
    /// This is the only place an OWNER row is created.
    pub async fn create(
        &self,
        name: String,
        description: Option<String>,
        settings: OrganizationSettings,
        creator_id: ObjectId,
    ) -> DaoResult<Organization> {
        let now = DateTime::now();
        let organization = Organization {
            id: None,
            name,
            description,
            settings,
            created_by: creator_id,
            created_at: now,
            updated_at: now,
        };

        let mut session = self.tx.begin().await?;

        let result = self
            .base
            .collection()
            .insert_one(&organization)
            .session(&mut session)
            .await
            .map_err(map_write_error)?;
        let organization_id = inserted_object_id(result)?;

        let owner = OrganizationMember {
            id: None,
            organization_id,
            user_id: creator_id,
            role: OrgRole::Owner,
            joined_at: now,
            invited_by: None,
            created_at: now,
            updated_at: now,
        };
        self.members
            .collection()
            .insert_one(&owner)
            .session(&mut session)
            .await
            .map_err(map_write_error)?;

        self.tx.commit(&mut session).await?;

        info!(%organization_id, %creator_id, "Organization created");
        self.base.find_by_id(organization_id).await
    }

    pub async fn find(&self, organization_id: ObjectId) -> DaoResult<Organization> {
        self.base.find_by_id(organization_id).await
    }

    pub async fn find_user_organizations(&self, user_id: ObjectId) -> DaoResult<Vec<Organization>> {
        let memberships = self
            .members
            .find_many(doc! { "user_id": user_id }, None)
            .await?;

        let organization_ids: Vec<ObjectId> =
            memberships.iter().map(|m| m.organization_id).collect();

        if organization_ids.is_empty() {
            return Ok(Vec::new());
        }

        self.base
            .find_many(
                doc! { "_id": { "$in": organization_ids } },
                Some(doc! { "name": 1 }),
            )
            .await
    }

    pub async fn update(
        &self,
        organization_id: ObjectId,
        name: Option<String>,
        description: Option<String>,
        settings: Option<OrganizationSettings>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = name {
            update.insert("name", name);
        }
        if let Some(description) = description {
            update.insert("description", description);
        }
        if let Some(settings) = settings {
            update.insert("settings", bson::to_bson(&settings)?);
        }

        if update.is_empty() {
            return Ok(false);
        }

        self.base
            .update_by_id(organization_id, doc! { "$set": update })
            .await
    }

    /// Removes the organization with its members and invitations, and
    /// soft-deletes its projects.
    pub async fn delete(&self, organization_id: ObjectId) -> DaoResult<()> {
        let now = DateTime::now();
        let mut session = self.tx.begin().await?;

        self.projects
            .collection()
            .update_many(
                doc! { "organization_id": organization_id, "deleted_at": null },
                doc! { "$set": { "deleted_at": now, "updated_at": now } },
            )
            .session(&mut session)
            .await?;
        self.invitations
            .collection()
            .delete_many(doc! { "organization_id": organization_id })
            .session(&mut session)
            .await?;
        self.members
            .collection()
            .delete_many(doc! { "organization_id": organization_id })
            .session(&mut session)
            .await?;
        let deleted = self
            .base
            .collection()
            .delete_one(doc! { "_id": organization_id })
            .session(&mut session)
            .await?;

        if deleted.deleted_count == 0 {
            return Err(DaoError::NotFound);
        }

        self.tx.commit(&mut session).await?;
        info!(%organization_id, "Organization deleted");
        Ok(())
    }

    // -- Members --

    pub async fn find_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<OrganizationMember>> {
        self.members
            .find_one(doc! { "organization_id": organization_id, "user_id": user_id })
            .await
    }

    pub async fn member_role(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<Option<OrgRole>> {
        Ok(self
            .find_member(organization_id, user_id)
            .await?
            .map(|m| m.role))
    }

    pub async fn is_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        let count = self
            .members
            .count(doc! { "organization_id": organization_id, "user_id": user_id })
            .await?;
        Ok(count > 0)
    }

    pub async fn list_members(
        &self,
        organization_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<OrganizationMember>> {
        self.members
            .find_paginated(
                doc! { "organization_id": organization_id },
                Some(doc! { "joined_at": 1 }),
                params,
            )
            .await
    }

    pub async fn remove_member(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        let removed = self
            .members
            .hard_delete(doc! {
                "organization_id": organization_id,
                "user_id": user_id,
                "role": { "$ne": OrgRole::Owner.as_str() },
            })
            .await?;
        Ok(removed > 0)
    }

    pub async fn update_member_role(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: OrgRole,
    ) -> DaoResult<bool> {
        self.members
            .update_one(
                doc! {
                    "organization_id": organization_id,
                    "user_id": user_id,
                    "role": { "$ne": OrgRole::Owner.as_str() },
                },
                doc! { "$set": { "role": role.as_str() } },
            )
            .await
    }

    // -- Invitations --

    pub async fn insert_invitation(
        &self,
        invitation: &OrganizationInvitation,
    ) -> DaoResult<OrganizationInvitation> {
        let id = self.invitations.insert_one(invitation).await?;
        self.invitations.find_by_id(id).await
    }

    pub async fn find_invitation_by_token(&self, token: &str) -> DaoResult<OrganizationInvitation> {
        self.invitations
            .find_one(doc! { "token": token })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn find_pending_invitation(
        &self,
        organization_id: ObjectId,
        email: &str,
    ) -> DaoResult<Option<OrganizationInvitation>> {
        self.invitations
            .find_one(doc! {
                "organization_id": organization_id,
                "email": email,
                "status": InvitationStatus::Pending.as_str(),
            })
            .await
    }

    pub async fn list_invitations(
        &self,
        organization_id: ObjectId,
    ) -> DaoResult<Vec<OrganizationInvitation>> {
        self.invitations
            .find_many(
                doc! { "organization_id": organization_id },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    /// Flips a pending invitation to EXPIRED. Terminal states are left alone.
    pub async fn mark_invitation_expired(&self, invitation_id: ObjectId) -> DaoResult<bool> {
        self.invitations
            .update_one(
                doc! { "_id": invitation_id, "status": InvitationStatus::Pending.as_str() },
                doc! { "$set": { "status": InvitationStatus::Expired.as_str() } },
            )
            .await
    }

    pub async fn delete_invitation(
        &self,
        organization_id: ObjectId,
        invitation_id: ObjectId,
    ) -> DaoResult<bool> {
        let deleted = self
            .invitations
            .hard_delete(doc! { "_id": invitation_id, "organization_id": organization_id })
            .await?;
        Ok(deleted > 0)
    }

    /// Claims a pending invitation for `user_id` and creates the membership.
    ///
    /// Returns `Ok(false)` when the invitation was no longer pending at write
    /// time (another request accepted or expired it first).
    pub async fn accept_invitation(
        &self,
        invitation: &OrganizationInvitation,
        user_id: ObjectId,
    ) -> DaoResult<bool> {
        let invitation_id = invitation.id.ok_or(DaoError::NotFound)?;
        let now = DateTime::now();
        let mut session = self.tx.begin().await?;

        let claimed = self
            .invitations
            .collection()
            .update_one(
                doc! { "_id": invitation_id, "status": InvitationStatus::Pending.as_str() },
                doc! { "$set": {
                    "status": InvitationStatus::Accepted.as_str(),
                    "accepted_by": user_id,
                    "accepted_at": now,
                    "updated_at": now,
                } },
            )
            .session(&mut session)
            .await?;

        if claimed.matched_count == 0 {
            return Ok(false);
        }

        let member = OrganizationMember {
            id: None,
            organization_id: invitation.organization_id,
            user_id,
            role: invitation.role,
            joined_at: now,
            invited_by: Some(invitation.invited_by),
            created_at: now,
            updated_at: now,
        };

        let inserted = self
            .members
            .collection()
            .insert_one(&member)
            .session(&mut session)
            .await
            .map_err(map_write_error);

        if let Err(e) = inserted {
            if !self.tx.is_enabled() {
                // Without a transaction the claim is already visible; put it back.
                warn!(%invitation_id, error = %e, "Membership insert failed, releasing invitation");
                self.invitations
                    .collection()
                    .update_one(
                        doc! { "_id": invitation_id },
                        doc! { "$set": { "status": InvitationStatus::Pending.as_str(), "accepted_by": null, "accepted_at": null } },
                    )
                    .await?;
            }
            return Err(e);
        }

        self.tx.commit(&mut session).await?;
        Ok(true)
    }
}
