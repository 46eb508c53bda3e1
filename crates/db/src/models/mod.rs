pub mod comment;
pub mod document;
pub mod invitation;
pub mod organization;
pub mod organization_member;
pub mod project;
pub mod role;
pub mod sprint;
pub mod task;
pub mod user;

pub use comment::Comment;
pub use document::{DocType, Document};
pub use invitation::{InvitationStatus, OrganizationInvitation};
pub use organization::{Organization, OrganizationSettings};
pub use organization_member::OrganizationMember;
pub use project::{Project, ProjectState};
pub use role::{GlobalRole, OrgRole, UnknownRole};
pub use sprint::{Sprint, SprintStatus};
pub use task::{Task, TaskPriority, TaskStatus, TaskType};
pub use user::User;
