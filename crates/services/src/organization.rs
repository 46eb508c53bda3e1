use std::sync::Arc;

use bson::oid::ObjectId;
use tracing::{debug, info};
use workhub_db::models::{OrgRole, Organization, OrganizationMember, OrganizationSettings};

use crate::access::{AccessError, AccessResolver, AccessResult, Principal};
use crate::dao::{
    base::{PaginatedResult, PaginationParams},
    organization::OrganizationDao,
};

/// Organization lifecycle and member management behind the role gate.
pub struct OrganizationService {
    organizations: Arc<OrganizationDao>,
    access: Arc<AccessResolver>,
}

impl OrganizationService {
    pub fn new(organizations: Arc<OrganizationDao>, access: Arc<AccessResolver>) -> Self {
        Self {
            organizations,
            access,
        }
    }

    /// The creator becomes the sole OWNER.
    pub async fn create(
        &self,
        principal: &Principal,
        name: String,
        description: Option<String>,
        settings: OrganizationSettings,
    ) -> AccessResult<Organization> {
        if !principal.global_role.can_create_top_level() {
            debug!(user_id = %principal.user_id, "Organization creation denied");
            return Err(AccessError::forbidden(
                "Only owners and admins can create organizations",
            ));
        }
        Ok(self
            .organizations
            .create(name, description, settings, principal.user_id)
            .await?)
    }

    pub async fn list_for(&self, principal: &Principal) -> AccessResult<Vec<Organization>> {
        Ok(self
            .organizations
            .find_user_organizations(principal.user_id)
            .await?)
    }

    pub async fn get(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
    ) -> AccessResult<(Organization, OrgRole)> {
        self.access.require_member(principal, organization_id).await
    }

    pub async fn update(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        name: Option<String>,
        description: Option<String>,
        settings: Option<OrganizationSettings>,
    ) -> AccessResult<Organization> {
        self.access.require_owner(principal, organization_id).await?;
        self.organizations
            .update(organization_id, name, description, settings)
            .await?;
        self.organizations
            .find(organization_id)
            .await
            .map_err(AccessError::missing("Organization"))
    }

    pub async fn delete(&self, principal: &Principal, organization_id: ObjectId) -> AccessResult<()> {
        self.access.require_owner(principal, organization_id).await?;
        self.organizations
            .delete(organization_id)
            .await
            .map_err(AccessError::missing("Organization"))
    }

    pub async fn list_members(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        params: &PaginationParams,
    ) -> AccessResult<PaginatedResult<OrganizationMember>> {
        self.access.require_member(principal, organization_id).await?;
        Ok(self
            .organizations
            .list_members(organization_id, params)
            .await?)
    }

    async fn load_target(
        &self,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<OrganizationMember> {
        self.organizations
            .find_member(organization_id, user_id)
            .await?
            .ok_or(AccessError::NotFound("Member"))
    }

    /// OWNER gate at the route, then an OWNER-or-ADMIN re-check here. The
    /// OWNER row can never be removed, not even by itself.
    pub async fn remove_member(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        user_id: ObjectId,
    ) -> AccessResult<()> {
        self.access.require_owner(principal, organization_id).await?;
        self.access
            .require_owner_or_admin(principal, organization_id)
            .await?;

        let target = self.load_target(organization_id, user_id).await?;
        if target.role == OrgRole::Owner {
            debug!(%organization_id, %user_id, "Refusing to remove organization owner");
            return Err(AccessError::OwnerProtected);
        }

        // The store filter excludes OWNER rows as well, so a concurrent
        // promotion cannot slip through.
        if !self.organizations.remove_member(organization_id, user_id).await? {
            return Err(AccessError::NotFound("Member"));
        }
        info!(%organization_id, %user_id, removed_by = %principal.user_id, "Member removed");
        Ok(())
    }

    pub async fn update_member_role(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        user_id: ObjectId,
        role: OrgRole,
    ) -> AccessResult<OrganizationMember> {
        self.access.require_owner(principal, organization_id).await?;

        // The OWNER row is rejected the same way as in removal, whatever the new role
        let target = self.load_target(organization_id, user_id).await?;
        if target.role == OrgRole::Owner {
            debug!(%organization_id, %user_id, "Refusing to change organization owner role");
            return Err(AccessError::OwnerProtected);
        }

        if !role.is_assignable() {
            return Err(AccessError::Validation(
                "Role must be admin or member".to_string(),
            ));
        }

        if !self
            .organizations
            .update_member_role(organization_id, user_id, role)
            .await?
        {
            return Err(AccessError::NotFound("Member"));
        }
        info!(%organization_id, %user_id, %role, "Member role updated");
        self.load_target(organization_id, user_id).await
    }

    pub async fn leave(&self, principal: &Principal, organization_id: ObjectId) -> AccessResult<()> {
        let (_, role) = self.access.require_member(principal, organization_id).await?;
        if role == OrgRole::Owner {
            return Err(AccessError::OwnerProtected);
        }
        if !self
            .organizations
            .remove_member(organization_id, principal.user_id)
            .await?
        {
            return Err(AccessError::NotFound("Member"));
        }
        info!(%organization_id, user_id = %principal.user_id, "Member left organization");
        Ok(())
    }
}
