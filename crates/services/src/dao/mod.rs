pub mod base;
pub mod comment;
pub mod document;
pub mod organization;
pub mod project;
pub mod sprint;
pub mod task;
pub mod user;

pub use base::BaseDao;
