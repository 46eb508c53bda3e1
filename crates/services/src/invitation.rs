//! Organization invitation lifecycle.
//!
//! States move PENDING → ACCEPTED or PENDING → EXPIRED and never leave a
//! terminal state. Expiry is detected lazily: an invitation past its
//! `expires_at` is flipped to EXPIRED the next time it is read or accepted.

use std::sync::Arc;

use bson::{oid::ObjectId, DateTime};
use serde::Serialize;
use tracing::{debug, info, warn};
use workhub_db::models::{InvitationStatus, OrgRole, Organization, OrganizationInvitation};

use crate::access::{AccessError, AccessResolver, AccessResult, Principal, rules};
use crate::dao::{
    base::DaoError,
    organization::OrganizationDao,
    user::{UserDao, normalize_email},
};
use crate::mailer::{InvitationEmail, InviteMailer};

/// Bytes of randomness behind each token (hex-encoded to twice as many chars).
pub const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::random();
    hex::encode(bytes)
}

/// Checks that an invitation can still be used at `now`.
///
/// Non-pending invitations fail with `AlreadyUsedOrExpired`. A pending one
/// past its expiry fails with `Expired`; the caller is expected to persist
/// the EXPIRED state.
pub fn check_usable(invitation: &OrganizationInvitation, now: DateTime) -> AccessResult<()> {
    if invitation.status != InvitationStatus::Pending {
        return Err(AccessError::AlreadyUsedOrExpired);
    }
    if invitation.is_past_expiry(now) {
        return Err(AccessError::Expired);
    }
    Ok(())
}

/// Result of a successful invite. `invite_link` is always present so the
/// client can share it manually when `email_sent` is false.
#[derive(Debug, Clone)]
pub struct CreatedInvitation {
    pub invitation: OrganizationInvitation,
    pub invite_link: String,
    pub email_sent: bool,
}

/// Public view of an invitation, shown before the invitee signs in.
#[derive(Debug, Clone, Serialize)]
pub struct InvitationDetails {
    pub organization_id: String,
    pub organization_name: String,
    pub organization_description: Option<String>,
    pub email: String,
    pub role: OrgRole,
    pub expires_at: String,
}

pub struct InvitationService {
    organizations: Arc<OrganizationDao>,
    users: Arc<UserDao>,
    access: Arc<AccessResolver>,
    mailer: Arc<dyn InviteMailer>,
    public_url: String,
    ttl_days: i64,
}

impl InvitationService {
    pub fn new(
        organizations: Arc<OrganizationDao>,
        users: Arc<UserDao>,
        access: Arc<AccessResolver>,
        mailer: Arc<dyn InviteMailer>,
        public_url: String,
        ttl_days: i64,
    ) -> Self {
        Self {
            organizations,
            users,
            access,
            mailer,
            public_url: public_url.trim_end_matches('/').to_string(),
            ttl_days,
        }
    }

    pub fn invite_link(&self, token: &str) -> String {
        format!("{}/invite/{}", self.public_url, token)
    }

    pub async fn create_invitation(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        email: &str,
        role: OrgRole,
    ) -> AccessResult<CreatedInvitation> {
        let organization = self
            .organizations
            .find(organization_id)
            .await
            .map_err(AccessError::missing("Organization"))?;

        let inviter_role = self
            .access
            .resolve_org_role(principal.user_id, organization_id)
            .await?;
        if !rules::can_invite(inviter_role, &organization.settings) {
            debug!(user_id = %principal.user_id, %organization_id, ?inviter_role, "Invite denied");
            return Err(AccessError::forbidden(
                "You are not allowed to invite members to this organization",
            ));
        }

        if !role.is_assignable() {
            return Err(AccessError::Validation(
                "Invitations can only grant the admin or member role".to_string(),
            ));
        }

        let email = normalize_email(email);
        if email.is_empty() || !email.contains('@') {
            return Err(AccessError::Validation("Invalid email address".to_string()));
        }

        match self.users.find_by_email(&email).await {
            Ok(user) => {
                if let Some(user_id) = user.id {
                    if self.organizations.is_member(organization_id, user_id).await? {
                        return Err(AccessError::AlreadyMember);
                    }
                }
            }
            Err(DaoError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let now = DateTime::now();
        if let Some(existing) = self
            .organizations
            .find_pending_invitation(organization_id, &email)
            .await?
        {
            if existing.is_past_expiry(now) {
                self.expire(&existing).await?;
            } else {
                return Err(AccessError::AlreadyInvited);
            }
        }

        let expires_at = DateTime::from_chrono(
            now.to_chrono() + chrono::Duration::days(self.ttl_days),
        );
        let invitation = OrganizationInvitation {
            id: None,
            organization_id,
            email: email.clone(),
            role,
            token: generate_token(),
            invited_by: principal.user_id,
            status: InvitationStatus::Pending,
            expires_at,
            accepted_by: None,
            accepted_at: None,
            created_at: now,
            updated_at: now,
        };

        // The partial unique index is the real guard against concurrent invites
        let invitation = match self.organizations.insert_invitation(&invitation).await {
            Ok(invitation) => invitation,
            Err(DaoError::DuplicateKey(_)) => return Err(AccessError::AlreadyInvited),
            Err(e) => return Err(e.into()),
        };

        let invite_link = self.invite_link(&invitation.token);
        let inviter_name = match self.users.find_active(principal.user_id).await {
            Ok(user) => user.display_name,
            Err(_) => principal.email.clone(),
        };
        let outcome = self
            .mailer
            .send_invitation(&InvitationEmail {
                to: email.clone(),
                organization_name: organization.name.clone(),
                inviter_name,
                role: role.to_string(),
                invite_link: invite_link.clone(),
                expires_in_days: self.ttl_days,
            })
            .await;

        if !outcome.was_sent() {
            warn!(%organization_id, email = %email, ?outcome, "Invitation email not delivered, returning link");
        }
        info!(%organization_id, email = %email, %role, "Invitation created");

        Ok(CreatedInvitation {
            invitation,
            invite_link,
            email_sent: outcome.was_sent(),
        })
    }

    async fn expire(&self, invitation: &OrganizationInvitation) -> AccessResult<()> {
        if let Some(id) = invitation.id {
            if self.organizations.mark_invitation_expired(id).await? {
                info!(invitation_id = %id, "Invitation expired");
            }
        }
        Ok(())
    }

    /// Loads a usable invitation by token, persisting EXPIRED on the way.
    async fn load_usable(&self, token: &str) -> AccessResult<OrganizationInvitation> {
        let invitation = self
            .organizations
            .find_invitation_by_token(token)
            .await
            .map_err(AccessError::missing("Invitation"))?;

        if let Err(e) = check_usable(&invitation, DateTime::now()) {
            if matches!(e, AccessError::Expired) {
                self.expire(&invitation).await?;
            }
            return Err(e);
        }
        Ok(invitation)
    }

    /// Unauthenticated lookup used by the invite landing page.
    pub async fn details(&self, token: &str) -> AccessResult<InvitationDetails> {
        let invitation = self.load_usable(token).await?;
        let organization = self
            .organizations
            .find(invitation.organization_id)
            .await
            .map_err(AccessError::missing("Organization"))?;

        Ok(InvitationDetails {
            organization_id: invitation.organization_id.to_hex(),
            organization_name: organization.name,
            organization_description: organization.description,
            email: invitation.email,
            role: invitation.role,
            expires_at: invitation
                .expires_at
                .try_to_rfc3339_string()
                .unwrap_or_default(),
        })
    }

    pub async fn accept(&self, token: &str, principal: &Principal) -> AccessResult<Organization> {
        let invitation = self.load_usable(token).await?;

        if normalize_email(&principal.email) != invitation.email {
            debug!(user_id = %principal.user_id, "Invitation email mismatch");
            return Err(AccessError::WrongEmail);
        }

        if self
            .organizations
            .is_member(invitation.organization_id, principal.user_id)
            .await?
        {
            return Err(AccessError::AlreadyMember);
        }

        match self
            .organizations
            .accept_invitation(&invitation, principal.user_id)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(AccessError::AlreadyUsedOrExpired),
            Err(DaoError::DuplicateKey(_)) => return Err(AccessError::AlreadyMember),
            Err(e) => return Err(e.into()),
        }

        info!(
            organization_id = %invitation.organization_id,
            user_id = %principal.user_id,
            role = %invitation.role,
            "Invitation accepted"
        );

        self.organizations
            .find(invitation.organization_id)
            .await
            .map_err(AccessError::missing("Organization"))
    }

    /// Owner-only. Deletes the invitation whatever its status, but only
    /// when it belongs to `organization_id`.
    pub async fn cancel(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
        invitation_id: ObjectId,
    ) -> AccessResult<()> {
        self.access.require_owner(principal, organization_id).await?;

        if !self
            .organizations
            .delete_invitation(organization_id, invitation_id)
            .await?
        {
            return Err(AccessError::NotFound("Invitation"));
        }
        info!(%organization_id, %invitation_id, "Invitation cancelled");
        Ok(())
    }

    /// Owners and admins see every invitation; stale pending ones are
    /// reported (and stored) as EXPIRED.
    pub async fn list(
        &self,
        principal: &Principal,
        organization_id: ObjectId,
    ) -> AccessResult<Vec<OrganizationInvitation>> {
        self.access
            .require_owner_or_admin(principal, organization_id)
            .await?;

        let now = DateTime::now();
        let mut invitations = self.organizations.list_invitations(organization_id).await?;
        for invitation in invitations.iter_mut() {
            if invitation.status == InvitationStatus::Pending && invitation.is_past_expiry(now) {
                self.expire(invitation).await?;
                invitation.status = InvitationStatus::Expired;
            }
        }
        Ok(invitations)
    }
}
