//! Read policy: who may read a project without a grant

use serde::{Deserialize, Serialize};

use crate::constants::ENV_READ_POLICY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Any authenticated principal may read any project
    #[default]
    AllAuthenticated,
    /// Reads require a grant like every other permission
    GroupsOnly,
}

impl ReadPolicy {
    /// Parse a configured value. Unknown, empty or missing values fall back to
    /// `AllAuthenticated`.
    pub fn parse(raw: Option<&str>) -> ReadPolicy {
        let Some(raw) = raw else { return ReadPolicy::default() };
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" | "all-authenticated" | "all_authenticated" => ReadPolicy::AllAuthenticated,
            "groups" | "groups-only" | "groups_only" => ReadPolicy::GroupsOnly,
            _ => ReadPolicy::default(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadPolicy::AllAuthenticated => "all_authenticated",
            ReadPolicy::GroupsOnly => "groups_only",
        }
    }
}

/// Where the authorizer takes its read policy from. Resolved on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicySource {
    /// Re-read `HIT_PROJECTS_READ_POLICY` each time
    #[default]
    Env,
    Fixed(ReadPolicy),
}

impl PolicySource {
    pub fn current(&self) -> ReadPolicy {
        match self {
            PolicySource::Env => ReadPolicy::parse(std::env::var(ENV_READ_POLICY).ok().as_deref()),
            PolicySource::Fixed(p) => *p,
        }
    }
}
