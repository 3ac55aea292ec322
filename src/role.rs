//! Project roles, ordered by privilege

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A project-scoped role. Variant order is the privilege order:
/// `Viewer < Contributor < Manager < Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Contributor,
    Manager,
    Owner,
}

impl Role {
    /// All roles, least privileged first
    pub const ALL: [Role; 4] = [Role::Viewer, Role::Contributor, Role::Manager, Role::Owner];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Contributor => "contributor",
            Role::Manager => "manager",
            Role::Owner => "owner",
        }
    }

    /// Reduce any number of roles to the most privileged one
    pub fn highest<I: IntoIterator<Item = Role>>(roles: I) -> Option<Role> {
        roles.into_iter().max()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidRole(s.to_string()))
    }
}
