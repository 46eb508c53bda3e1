pub mod auth;
pub mod document;
pub mod invitation;
pub mod member;
pub mod organization;
pub mod project;
pub mod sprint;
pub mod task;

use bson::{DateTime, oid::ObjectId};

use crate::error::ApiError;

/// Parses a path or body id, naming the field in the 400 message.
pub(crate) fn parse_id(value: &str, field: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value).map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

pub(crate) fn parse_optional_id(
    value: Option<&str>,
    field: &str,
) -> Result<Option<ObjectId>, ApiError> {
    value.map(|v| parse_id(v, field)).transpose()
}

pub(crate) fn parse_date(value: Option<&str>, field: &str) -> Result<Option<DateTime>, ApiError> {
    value
        .map(|v| {
            DateTime::parse_rfc3339_str(v)
                .map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
        })
        .transpose()
}

pub(crate) fn rfc3339(value: DateTime) -> String {
    value.try_to_rfc3339_string().unwrap_or_default()
}

pub(crate) fn hex_id(id: Option<ObjectId>) -> String {
    id.map(|id| id.to_hex()).unwrap_or_default()
}
