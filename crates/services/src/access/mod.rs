//! Authorization and multi-tenancy core.
//!
//! Every project-scoped request resolves the caller's relationship to the
//! resource (ownership, then the explicit member list, then the
//! organization membership chain) before the operation runs.

pub mod error;
pub mod resolver;
pub mod rules;

use bson::oid::ObjectId;
use workhub_db::models::GlobalRole;

pub use error::{AccessError, AccessResult, ErrorKind};
pub use resolver::AccessResolver;

/// The authenticated caller, passed explicitly into every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: ObjectId,
    pub email: String,
    pub global_role: GlobalRole,
}

impl Principal {
    pub fn new(user_id: ObjectId, email: impl Into<String>, global_role: GlobalRole) -> Self {
        Self {
            user_id,
            email: email.into(),
            global_role,
        }
    }

    pub fn is_global_admin(&self) -> bool {
        self.global_role == GlobalRole::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    View,
    Edit,
}

/// Outcome of resolving a caller against a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAccess {
    /// Missing or soft-deleted.
    NotFound,
    Forbidden,
    View,
    /// Edit and delete.
    Owner,
}

impl ProjectAccess {
    pub fn can_view(&self) -> bool {
        matches!(self, ProjectAccess::View | ProjectAccess::Owner)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, ProjectAccess::Owner)
    }

    /// Converts the outcome into an error unless it grants `mode`.
    pub fn require(self, mode: AccessMode) -> AccessResult<()> {
        match (self, mode) {
            (ProjectAccess::NotFound, _) => Err(AccessError::NotFound("Project")),
            (ProjectAccess::Forbidden, _) => {
                Err(AccessError::forbidden("You do not have access to this project"))
            }
            (ProjectAccess::View, AccessMode::Edit) => Err(AccessError::forbidden(
                "Only the project owner or organization owner can modify this project",
            )),
            (ProjectAccess::View, AccessMode::View) | (ProjectAccess::Owner, _) => Ok(()),
        }
    }
}
