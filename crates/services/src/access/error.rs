use thiserror::Error;

use crate::dao::base::DaoError;

/// Stable failure categories. Callers pick a transport status from these;
/// the access layer never deals in HTTP codes itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Unauthenticated,
    Conflict,
    Expired,
    InvalidReference,
    Internal,
}

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("User is already a member of this organization")]
    AlreadyMember,
    #[error("An invitation is already pending for this email")]
    AlreadyInvited,
    #[error("Invitation has already been used or has expired")]
    AlreadyUsedOrExpired,
    #[error("Invitation has expired")]
    Expired,
    #[error("This invitation was sent to a different email address")]
    WrongEmail,
    #[error("The organization owner cannot be removed or have their role changed")]
    OwnerProtected,
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] DaoError),
}

pub type AccessResult<T> = Result<T, AccessError>;

impl AccessError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        AccessError::Forbidden(reason.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::NotFound(_) => ErrorKind::NotFound,
            AccessError::Forbidden(_) | AccessError::WrongEmail | AccessError::OwnerProtected => {
                ErrorKind::Forbidden
            }
            AccessError::Unauthenticated => ErrorKind::Unauthenticated,
            AccessError::AlreadyMember
            | AccessError::AlreadyInvited
            | AccessError::AlreadyUsedOrExpired => ErrorKind::Conflict,
            AccessError::Expired => ErrorKind::Expired,
            AccessError::InvalidReference(_) | AccessError::Validation(_) => {
                ErrorKind::InvalidReference
            }
            AccessError::Store(DaoError::NotFound) => ErrorKind::NotFound,
            AccessError::Store(DaoError::DuplicateKey(_)) => ErrorKind::Conflict,
            AccessError::Store(_) => ErrorKind::Internal,
        }
    }

    /// Turns a generic store miss into a not-found for a named resource.
    pub fn missing(what: &'static str) -> impl FnOnce(DaoError) -> AccessError {
        move |e| match e {
            DaoError::NotFound => AccessError::NotFound(what),
            other => AccessError::Store(other),
        }
    }
}
