//! Group resolution: claims first, identity service as a best-effort fallback
//!
//! A failed lookup never fails a decision. It is kept as a [`GroupLookup::Failed`]
//! value so callers can log or test it, then folded into the empty set.

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::SERVICE_TOKEN_HEADER;
use crate::error::{Error, Result};
use crate::principal::Principal;

pub type GroupSet = BTreeSet<String>;

/// Keys checked on each record of the identity service's response, in order
const GROUP_ID_KEYS: [&str; 3] = ["group_id", "groupId", "id"];

/// Why a directory lookup produced nothing usable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("identity service not configured")]
    NotConfigured,
    #[error("timed out")]
    Timeout,
    #[error("transport: {0}")]
    Transport(String),
    #[error("status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Outcome of one directory lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLookup {
    Resolved(GroupSet),
    Failed(LookupFailure),
}

impl GroupLookup {
    pub fn into_groups(self) -> GroupSet {
        match self {
            GroupLookup::Resolved(g) => g,
            GroupLookup::Failed(_) => GroupSet::new(),
        }
    }
}

impl From<std::result::Result<GroupSet, LookupFailure>> for GroupLookup {
    fn from(r: std::result::Result<GroupSet, LookupFailure>) -> Self {
        match r {
            Ok(g) => GroupLookup::Resolved(g),
            Err(f) => GroupLookup::Failed(f),
        }
    }
}

/// How a principal's groups were obtained
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupResolution {
    /// Non-empty `groupIds` carried by the principal
    Claims(GroupSet),
    /// Asked the directory by identifier
    Lookup(GroupLookup),
    /// No claims and no identifier to look up
    NoIdentity,
}

impl GroupResolution {
    pub fn groups(&self) -> GroupSet {
        match self {
            GroupResolution::Claims(g) | GroupResolution::Lookup(GroupLookup::Resolved(g)) => g.clone(),
            GroupResolution::Lookup(GroupLookup::Failed(_)) | GroupResolution::NoIdentity => GroupSet::new(),
        }
    }

    pub fn failure(&self) -> Option<&LookupFailure> {
        match self {
            GroupResolution::Lookup(GroupLookup::Failed(f)) => Some(f),
            _ => None,
        }
    }
}

/// Source of group memberships for identifiers that carry no claims
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn groups_for(&self, identifier: &str) -> GroupLookup;
}

/// Resolve the groups of a principal. Never errors.
pub async fn resolve_groups<D: GroupDirectory + ?Sized>(directory: &D, principal: &Principal) -> GroupResolution {
    if let Some(ids) = principal.group_ids.as_ref().filter(|g| !g.is_empty()) {
        return GroupResolution::Claims(ids.iter().cloned().collect());
    }
    let identifier = principal.identifier.trim();
    if identifier.is_empty() {
        return GroupResolution::NoIdentity;
    }
    let lookup = directory.groups_for(identifier).await;
    match &lookup {
        GroupLookup::Resolved(g) => debug!(identifier, count = g.len(), "groups resolved from directory"),
        GroupLookup::Failed(f) => warn!(identifier, failure = %f, "group lookup failed, continuing without groups"),
    }
    GroupResolution::Lookup(lookup)
}

/// Normalize an identity service response into a set of group ids
pub fn parse_groups(body: &Value) -> std::result::Result<GroupSet, LookupFailure> {
    let items = body
        .as_array()
        .ok_or_else(|| LookupFailure::Malformed("expected a list".into()))?;
    Ok(items.iter().filter_map(group_id).collect())
}

/// First truthy id key wins. Structured values are not ids and drop the record.
fn group_id(item: &Value) -> Option<String> {
    let v = GROUP_ID_KEYS.iter().filter_map(|k| item.get(k)).find(|v| truthy(v))?;
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(_) | Value::Object(_) | Value::Null => None,
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ============================================================================
// HTTP directory
// ============================================================================

/// Directory backed by the identity service's admin API
#[derive(Debug, Clone)]
pub struct IdentityClient {
    client: reqwest::Client,
    base_url: Option<String>,
    service_token: Option<String>,
}

impl IdentityClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.lookup_timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.auth_url.clone(),
            service_token: config.service_token.clone(),
        })
    }

    /// `{base}/admin/users/{email}/groups`, email lowercased and percent-encoded
    pub fn groups_url(base: &str, identifier: &str) -> String {
        format!(
            "{}/admin/users/{}/groups",
            base.trim_end_matches('/'),
            urlencoding::encode(&identifier.to_lowercase())
        )
    }

    async fn fetch(&self, identifier: &str) -> std::result::Result<GroupSet, LookupFailure> {
        let base = self.base_url.as_deref().ok_or(LookupFailure::NotConfigured)?;
        let mut req = self
            .client
            .get(Self::groups_url(base, identifier))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.service_token {
            req = req.header(SERVICE_TOKEN_HEADER, token);
        }
        let res = req.send().await.map_err(transport)?;
        if !res.status().is_success() {
            return Err(LookupFailure::Status(res.status().as_u16()));
        }
        let body: Value = res.json().await.map_err(|e| {
            if e.is_timeout() { LookupFailure::Timeout } else { LookupFailure::Malformed(e.to_string()) }
        })?;
        parse_groups(&body)
    }
}

fn transport(e: reqwest::Error) -> LookupFailure {
    if e.is_timeout() {
        LookupFailure::Timeout
    } else {
        LookupFailure::Transport(e.to_string())
    }
}

#[async_trait]
impl GroupDirectory for IdentityClient {
    async fn groups_for(&self, identifier: &str) -> GroupLookup {
        self.fetch(identifier).await.into()
    }
}
