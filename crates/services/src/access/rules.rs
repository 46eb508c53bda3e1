//! Pure permission rules. Nothing here touches storage: callers load the
//! project, document and the caller's organization role first, then ask.
//!
//! Role sufficiency differs per resource and is kept that way on purpose:
//!
//! | action                         | org OWNER | org ADMIN | org MEMBER |
//! |--------------------------------|-----------|-----------|------------|
//! | view project / task            | yes       | yes       | yes        |
//! | edit or delete project         | yes       | no        | no         |
//! | create project in org          | yes       | no        | no         |
//! | create / edit / delete task    | yes       | yes       | no         |
//! | create / edit document in proj | yes       | no        | no         |

use workhub_db::models::{Document, OrgRole, OrganizationSettings, Project};

use super::error::{AccessError, AccessResult};
use super::{AccessMode, Principal, ProjectAccess};

/// Resolves what `principal` may do with `project`.
///
/// `org_role` is the caller's role in the project's organization, if the
/// project has one and the caller belongs to it.
pub fn project_access(
    principal: &Principal,
    project: &Project,
    org_role: Option<OrgRole>,
) -> ProjectAccess {
    let org_role = project.organization_id.and(org_role);

    if project.is_deleted() {
        return if principal.is_global_admin() {
            ProjectAccess::View
        } else {
            ProjectAccess::NotFound
        };
    }

    if project.is_owned_by(principal.user_id) || org_role == Some(OrgRole::Owner) {
        return ProjectAccess::Owner;
    }

    if principal.is_global_admin() || project.has_member(principal.user_id) || org_role.is_some() {
        return ProjectAccess::View;
    }

    ProjectAccess::Forbidden
}

/// Task permissions, resolved through the parent project.
///
/// Viewing follows the project view rule. Editing is granted to the project
/// owner and to organization owners and admins.
pub fn task_access(
    principal: &Principal,
    project: &Project,
    org_role: Option<OrgRole>,
    mode: AccessMode,
) -> AccessResult<bool> {
    match mode {
        AccessMode::View => match project_access(principal, project, org_role) {
            ProjectAccess::NotFound => Err(AccessError::NotFound("Project")),
            access => Ok(access.can_view()),
        },
        AccessMode::Edit => {
            if project.is_deleted() {
                return Err(AccessError::NotFound("Project"));
            }
            let org_role = project.organization_id.and(org_role);
            Ok(project.is_owned_by(principal.user_id)
                || org_role.is_some_and(|r| r.is_owner_or_admin()))
        }
    }
}

/// Whether `principal` may add tasks to `project`. Same rule as editing one.
pub fn can_create_task(
    principal: &Principal,
    project: &Project,
    org_role: Option<OrgRole>,
) -> AccessResult<bool> {
    task_access(principal, project, org_role, AccessMode::Edit)
}

/// Document permissions.
///
/// `parent` carries the document's project and the caller's role in that
/// project's organization. A deleted parent grants nothing.
pub fn document_access(
    principal: &Principal,
    document: &Document,
    parent: Option<(&Project, Option<OrgRole>)>,
    mode: AccessMode,
) -> bool {
    if document.is_owned_by(principal.user_id) {
        return true;
    }

    match mode {
        AccessMode::View => {
            document.is_public
                || document.has_collaborator(principal.user_id)
                || parent.is_some_and(|(project, role)| {
                    project_access(principal, project, role).can_view()
                })
        }
        AccessMode::Edit => parent.is_some_and(|(project, role)| {
            !project.is_deleted()
                && project.organization_id.is_some()
                && role == Some(OrgRole::Owner)
        }),
    }
}

/// Whether `principal` may create a document, standalone or inside `parent`.
pub fn can_create_document(
    principal: &Principal,
    parent: Option<(&Project, Option<OrgRole>)>,
) -> bool {
    match parent {
        None => principal.global_role.can_create_top_level(),
        Some((project, role)) => {
            project_access(principal, project, role) == ProjectAccess::Owner
        }
    }
}

/// Project creation gate.
///
/// `organization` is `None` for a standalone project, otherwise it holds the
/// creator's role in the target organization (if any). Inside an
/// organization only its OWNER may create projects.
pub fn can_create_project(principal: &Principal, organization: Option<Option<OrgRole>>) -> bool {
    match organization {
        None => principal.global_role.can_create_top_level(),
        Some(role) => role == Some(OrgRole::Owner),
    }
}

/// Whether a member holding `role` may invite others.
pub fn can_invite(role: Option<OrgRole>, settings: &OrganizationSettings) -> bool {
    match role {
        Some(OrgRole::Owner) | Some(OrgRole::Admin) => true,
        Some(OrgRole::Member) => settings.allow_member_invite,
        None => false,
    }
}
