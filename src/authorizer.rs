//! Authorizer: groups -> role -> decision, recomputed on every call

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::gate::{self, AuthorizationDecision};
use crate::groups::{resolve_groups, GroupDirectory, GroupResolution, GroupSet, IdentityClient};
use crate::permission::Permission;
use crate::policy::{PolicySource, ReadPolicy};
use crate::principal::Principal;
use crate::read::{GrantSource, LmdbGrants};
use crate::role::Role;

/// Decides what a principal may do on a project.
///
/// Holds no state between calls: groups, role and policy are derived again each
/// time, so a revoked grant takes effect on the next request.
pub struct Authorizer<D = IdentityClient, G = LmdbGrants> {
    directory: D,
    grants: G,
    policy: PolicySource,
}

impl Authorizer<IdentityClient, LmdbGrants> {
    /// Production wiring: identity service from `config`, LMDB grants, policy from env
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(IdentityClient::new(config)?, LmdbGrants, PolicySource::Env))
    }
}

impl<D: GroupDirectory, G: GrantSource> Authorizer<D, G> {
    pub fn new(directory: D, grants: G, policy: PolicySource) -> Self {
        Self { directory, grants, policy }
    }

    pub fn with_policy(mut self, policy: PolicySource) -> Self {
        self.policy = policy;
        self
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn grants(&self) -> &G {
        &self.grants
    }

    /// Read policy in effect right now
    pub fn policy(&self) -> ReadPolicy {
        self.policy.current()
    }

    pub async fn resolve_groups(&self, principal: &Principal) -> GroupResolution {
        resolve_groups(&self.directory, principal).await
    }

    /// Most privileged role any of `groups` holds on `project`.
    /// Empty `groups` returns `None` without touching the store.
    pub fn resolve_role(&self, project: &str, groups: &GroupSet) -> Result<Option<Role>> {
        if groups.is_empty() {
            return Ok(None);
        }
        Ok(Role::highest(self.grants.roles_for(project, groups)?))
    }

    /// Groups then role, for a principal that is not an admin
    pub async fn role_of(&self, principal: &Principal, project: &str) -> Result<Option<Role>> {
        let groups = self.resolve_groups(principal).await.groups();
        self.resolve_role(project, &groups)
    }

    /// Decide whether `principal` may perform `permission` on `project`.
    ///
    /// `Err` means the grant store failed; it is never reported as a deny.
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        project: &str,
        permission: Permission,
    ) -> Result<AuthorizationDecision> {
        let Some(principal) = principal else {
            return Ok(AuthorizationDecision::unauthorized());
        };
        if principal.is_admin() {
            debug!(who = %principal.identifier, project, %permission, "admin override");
            return Ok(AuthorizationDecision::admin());
        }
        let policy = self.policy.current();
        if !gate::needs_role(permission, policy) {
            return Ok(AuthorizationDecision::allow(None));
        }
        let role = self.role_of(principal, project).await?;
        let decision = gate::decide(permission, role);
        debug!(
            who = %principal.identifier,
            project,
            %permission,
            policy = policy.as_str(),
            role = ?role,
            allowed = decision.allowed,
            "authorization decided"
        );
        Ok(decision)
    }

    /// Like [`Authorizer::authorize`], for a permission given by wire name.
    /// Unknown names deny with 403 for every authenticated caller, admins included.
    pub async fn authorize_named(
        &self,
        principal: Option<&Principal>,
        project: &str,
        permission: &str,
    ) -> Result<AuthorizationDecision> {
        if principal.is_none() {
            return Ok(AuthorizationDecision::unauthorized());
        }
        match permission.parse::<Permission>() {
            Ok(p) => self.authorize(principal, project, p).await,
            Err(_) => {
                warn!(permission, project, "unknown permission requested");
                Ok(AuthorizationDecision::forbidden())
            }
        }
    }
}
