//! Read operations (no permission checks, direct LMDB access)

use serde::{Deserialize, Serialize};

use crate::db::read;
use crate::error::{Error, Result};
use crate::groups::GroupSet;
use crate::role::Role;

/// A persisted `(project, group, role)` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grant {
    pub project_id: String,
    pub group_id: String,
    pub role: Role,
}

fn parse_role(raw: &str) -> Result<Role> {
    raw.parse()
        .map_err(|_| Error::Store(format!("corrupt grant role {:?}", raw)))
}

/// Role a group holds on a project
pub fn get_grant(project: &str, group: &str) -> Result<Option<Role>> {
    read(|d, tx| d.grants.get(tx, project, group)?.as_deref().map(parse_role).transpose())
}

/// Roles held on a project by any of the given groups, in no particular order
pub fn roles_for(project: &str, groups: &GroupSet) -> Result<Vec<Role>> {
    read(|d, tx| {
        let mut r = Vec::new();
        for g in groups {
            if let Some(raw) = d.grants.get(tx, project, g)? {
                r.push(parse_role(&raw)?);
            }
        }
        Ok(r)
    })
}

/// All grants on a project
pub fn list_for_project(project: &str) -> Result<Vec<Grant>> {
    read(|d, tx| {
        d.grants
            .list_fwd(tx, project)?
            .into_iter()
            .map(|(group_id, raw)| -> Result<Grant> {
                Ok(Grant { project_id: project.to_string(), group_id, role: parse_role(&raw)? })
            })
            .collect()
    })
}

/// All grants held by a group
pub fn list_for_group(group: &str) -> Result<Vec<Grant>> {
    read(|d, tx| {
        d.grants
            .list_rev(tx, group)?
            .into_iter()
            .map(|(project_id, raw)| -> Result<Grant> {
                Ok(Grant { project_id, group_id: group.to_string(), role: parse_role(&raw)? })
            })
            .collect()
    })
}

// ============================================================================
// Grant source seam
// ============================================================================

/// Where the role resolver reads grants from.
///
/// Implementations must surface storage faults as errors; an empty result means
/// "no grants", never "could not tell".
pub trait GrantSource: Send + Sync {
    fn roles_for(&self, project: &str, groups: &GroupSet) -> Result<Vec<Role>>;
}

/// Grants in the process-wide LMDB store opened by [`crate::init`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LmdbGrants;

impl GrantSource for LmdbGrants {
    fn roles_for(&self, project: &str, groups: &GroupSet) -> Result<Vec<Role>> {
        roles_for(project, groups)
    }
}
