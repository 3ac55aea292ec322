//! Project permissions and their minimum-role table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::role::Role;

/// Operations a caller can request on a project.
///
/// Adding a variant means adding a row to [`Permission::allowed_roles`]; the match
/// there is exhaustive on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "project.read")]
    ProjectRead,
    #[serde(rename = "project.update")]
    ProjectUpdate,
    #[serde(rename = "project.archive")]
    ProjectArchive,
    #[serde(rename = "groups.manage")]
    GroupsManage,
    #[serde(rename = "milestones.manage")]
    MilestonesManage,
    #[serde(rename = "links.manage")]
    LinksManage,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Permission::ProjectRead,
        Permission::ProjectUpdate,
        Permission::ProjectArchive,
        Permission::GroupsManage,
        Permission::MilestonesManage,
        Permission::LinksManage,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ProjectRead => "project.read",
            Permission::ProjectUpdate => "project.update",
            Permission::ProjectArchive => "project.archive",
            Permission::GroupsManage => "groups.manage",
            Permission::MilestonesManage => "milestones.manage",
            Permission::LinksManage => "links.manage",
        }
    }

    /// Roles that satisfy this permission once membership is established
    pub fn allowed_roles(self) -> &'static [Role] {
        use Role::*;
        match self {
            Permission::ProjectRead => &[Owner, Manager, Contributor, Viewer],
            Permission::ProjectUpdate => &[Owner, Manager],
            Permission::ProjectArchive => &[Owner],
            Permission::GroupsManage => &[Owner],
            Permission::MilestonesManage => &[Owner, Manager, Contributor],
            Permission::LinksManage => &[Owner, Manager],
        }
    }

    #[inline]
    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    /// Exact wire names only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::InvalidPermission(s.to_string()))
    }
}
