use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account-wide capability flag. Distinct from [`OrgRole`], which only
/// applies inside one organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum GlobalRole {
    Admin,
    Owner,
    #[default]
    Member,
}

/// Role held by a member inside an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrgRole {
    Owner,
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl GlobalRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::Owner => "owner",
            GlobalRole::Member => "member",
        }
    }

    /// Owners and admins may create organizations and standalone projects.
    pub fn can_create_top_level(&self) -> bool {
        matches!(self, GlobalRole::Admin | GlobalRole::Owner)
    }
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Owner => "owner",
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }

    /// Roles that can be granted through an invitation or a role update.
    pub fn is_assignable(&self) -> bool {
        !matches!(self, OrgRole::Owner)
    }

    pub fn is_owner_or_admin(&self) -> bool {
        matches!(self, OrgRole::Owner | OrgRole::Admin)
    }
}

// Role strings arrive in mixed case ("ADMIN", "admin"); this is the only
// place they are normalized.
impl FromStr for GlobalRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(GlobalRole::Admin),
            "owner" => Ok(GlobalRole::Owner),
            "member" => Ok(GlobalRole::Member),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl FromStr for OrgRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owner" => Ok(OrgRole::Owner),
            "admin" => Ok(OrgRole::Admin),
            "member" => Ok(OrgRole::Member),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for GlobalRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for OrgRole {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GlobalRole> for String {
    fn from(role: GlobalRole) -> Self {
        role.as_str().to_string()
    }
}

impl From<OrgRole> for String {
    fn from(role: OrgRole) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for GlobalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
