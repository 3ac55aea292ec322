//! The authenticated caller

use serde::{Deserialize, Serialize};

use crate::constants::ADMIN_ROLE;

/// Supplied per request by the authentication layer; never persisted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    /// Email or subject
    pub identifier: String,
    /// Global role flags
    #[serde(default)]
    pub roles: Vec<String>,
    /// Group claims resolved upstream, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_ids: Option<Vec<String>>,
}

impl Principal {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self { identifier: identifier.into(), ..Default::default() }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_ids = Some(groups.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ADMIN_ROLE)
    }
}
