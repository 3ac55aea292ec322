//! Grant management API - every operation is checked against the actor's decision first

use tracing::info;

use crate::authorizer::Authorizer;
use crate::error::{Error, Result};
use crate::gate::AuthorizationDecision;
use crate::groups::GroupDirectory;
use crate::permission::Permission;
use crate::principal::Principal;
use crate::read::{list_for_project, Grant, GrantSource};
use crate::role::Role;
use crate::tx::transact;

/// Turn a deny into `Error::Denied`, carrying its status and reason
pub(crate) async fn require<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
    perm: Permission,
) -> Result<AuthorizationDecision> {
    let d = auth.authorize(actor, project, perm).await?;
    if d.allowed {
        Ok(d)
    } else {
        Err(Error::Denied { status: d.status_code, reason: d.reason().to_string() })
    }
}

/// Give a group a role on a project (requires groups.manage). Returns the replaced role.
pub async fn set_group_role<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
    group: &str,
    role: Role,
) -> Result<Option<Role>> {
    require(auth, actor, project, Permission::GroupsManage).await?;
    let prev = transact(|tx| tx.set_grant(project, group, role))?;
    info!(project, group, %role, previous = ?prev, "group role set");
    Ok(prev)
}

/// [`set_group_role`] for a role given by name. The name is only parsed once
/// the actor is allowed, so callers without access see 401/403, never 400.
pub async fn set_group_role_named<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
    group: &str,
    role: &str,
) -> Result<(Role, Option<Role>)> {
    require(auth, actor, project, Permission::GroupsManage).await?;
    let role: Role = role.parse()?;
    let prev = transact(|tx| tx.set_grant(project, group, role))?;
    info!(project, group, %role, previous = ?prev, "group role set");
    Ok((role, prev))
}

/// Remove a group's grant on a project (requires groups.manage)
pub async fn revoke_group<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
    group: &str,
) -> Result<bool> {
    require(auth, actor, project, Permission::GroupsManage).await?;
    let removed = transact(|tx| tx.revoke_grant(project, group))?;
    info!(project, group, removed, "group grant revoked");
    Ok(removed)
}

/// List the groups granted on a project (requires project.read)
pub async fn list_project_groups<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
) -> Result<Vec<Grant>> {
    require(auth, actor, project, Permission::ProjectRead).await?;
    list_for_project(project)
}

/// Drop every grant on a project being removed (requires project.archive)
pub async fn purge_project<D: GroupDirectory, G: GrantSource>(
    auth: &Authorizer<D, G>,
    actor: Option<&Principal>,
    project: &str,
) -> Result<usize> {
    require(auth, actor, project, Permission::ProjectArchive).await?;
    let n = transact(|tx| tx.purge_project(project))?;
    info!(project, removed = n, "project grants purged");
    Ok(n)
}
