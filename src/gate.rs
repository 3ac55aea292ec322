//! Permission gate: turns (permission, policy, role) into a decision

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::permission::Permission;
use crate::policy::ReadPolicy;
use crate::role::Role;

/// Result of an authorization check. `error_reason` doubles as the HTTP error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub resolved_role: Option<Role>,
    pub is_admin: bool,
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl AuthorizationDecision {
    pub fn allow(role: Option<Role>) -> Self {
        Self { allowed: true, resolved_role: role, is_admin: false, status_code: STATUS_OK, error_reason: None }
    }

    /// Admin override, reported as owner
    pub fn admin() -> Self {
        Self { is_admin: true, ..Self::allow(Some(Role::Owner)) }
    }

    pub fn unauthorized() -> Self {
        Self::deny(STATUS_UNAUTHORIZED, REASON_UNAUTHORIZED)
    }

    pub fn forbidden() -> Self {
        Self::deny(STATUS_FORBIDDEN, REASON_FORBIDDEN)
    }

    fn deny(status: u16, reason: &str) -> Self {
        Self {
            allowed: false,
            resolved_role: None,
            is_admin: false,
            status_code: status,
            error_reason: Some(reason.to_string()),
        }
    }

    /// Reason string for a denied decision
    pub fn reason(&self) -> &str {
        self.error_reason.as_deref().unwrap_or(REASON_FORBIDDEN)
    }
}

/// Whether deciding `permission` under `policy` needs the caller's project role.
/// Only open reads skip it.
#[inline]
pub fn needs_role(permission: Permission, policy: ReadPolicy) -> bool {
    !(permission == Permission::ProjectRead && policy == ReadPolicy::AllAuthenticated)
}

/// Decide for an authenticated non-admin caller whose role has been resolved.
/// No role means no membership, which always denies.
pub fn decide(permission: Permission, role: Option<Role>) -> AuthorizationDecision {
    match role {
        Some(r) if permission.permits(r) => AuthorizationDecision::allow(Some(r)),
        _ => AuthorizationDecision::forbidden(),
    }
}
