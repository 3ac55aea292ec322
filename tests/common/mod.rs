//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{MutexGuard, OnceLock};

use async_trait::async_trait;
use projgrant::*;
use tempfile::TempDir;

static DIR: OnceLock<TempDir> = OnceLock::new();

/// Lock, open the per-binary store and wipe it
pub fn setup() -> MutexGuard<'static, ()> {
    let lock = test_lock();
    let dir = DIR.get_or_init(|| TempDir::new().unwrap());
    init(dir.path().to_str().unwrap()).unwrap();
    clear_all().unwrap();
    lock
}

pub fn grant(project: &str, group: &str, role: Role) {
    transact(|tx| tx.set_grant(project, group, role)).unwrap();
}

pub fn set(items: &[&str]) -> GroupSet {
    items.iter().map(|s| s.to_string()).collect()
}

/// In-memory directory keyed by identifier; counts lookups
#[derive(Default)]
pub struct StaticDirectory {
    entries: HashMap<String, GroupLookup>,
    pub calls: AtomicUsize,
}

impl StaticDirectory {
    pub fn with(mut self, identifier: &str, groups: &[&str]) -> Self {
        self.entries.insert(identifier.to_string(), GroupLookup::Resolved(set(groups)));
        self
    }

    pub fn failing(mut self, identifier: &str, failure: LookupFailure) -> Self {
        self.entries.insert(identifier.to_string(), GroupLookup::Failed(failure));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GroupDirectory for StaticDirectory {
    async fn groups_for(&self, identifier: &str) -> GroupLookup {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries
            .get(identifier)
            .cloned()
            .unwrap_or(GroupLookup::Resolved(GroupSet::new()))
    }
}

/// LMDB grants that count how often the store is queried
#[derive(Default)]
pub struct CountingGrants {
    pub queries: AtomicUsize,
}

impl CountingGrants {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl GrantSource for CountingGrants {
    fn roles_for(&self, project: &str, groups: &GroupSet) -> Result<Vec<Role>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        LmdbGrants.roles_for(project, groups)
    }
}

/// A store that is down
pub struct FailingGrants;

impl GrantSource for FailingGrants {
    fn roles_for(&self, _project: &str, _groups: &GroupSet) -> Result<Vec<Role>> {
        Err(Error::Store("connection reset".into()))
    }
}

pub fn authorizer(dir: StaticDirectory, policy: ReadPolicy) -> Authorizer<StaticDirectory, LmdbGrants> {
    Authorizer::new(dir, LmdbGrants, PolicySource::Fixed(policy))
}
