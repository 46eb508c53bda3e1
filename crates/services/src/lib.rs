pub mod access;
pub mod auth;
pub mod dao;
pub mod invitation;
pub mod mailer;
pub mod organization;
pub mod task_generation;

pub use access::{AccessError, AccessMode, AccessResolver, AccessResult, Principal, ProjectAccess};
pub use auth::AuthService;
pub use dao::*;
pub use invitation::InvitationService;
pub use mailer::{DisabledMailer, InviteMailer, MailOutcome, SmtpMailer};
pub use organization::OrganizationService;
pub use task_generation::{TaskDraft, TaskGenerator};
