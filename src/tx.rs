//! Transaction wrapper for grant writes

use heed::RwTxn;

use crate::db::{dbs, env, Dbs};
use crate::error::{err, Result};
use crate::role::Role;

/// Transaction wrapper for batched writes
pub struct Tx {
    txn: Option<RwTxn<'static>>,
    dbs: &'static Dbs,
}

impl Tx {
    #[inline]
    pub(crate) fn new() -> Result<Self> {
        Ok(Tx {
            txn: Some(env()?.write_txn().map_err(err)?),
            dbs: dbs()?,
        })
    }

    #[inline]
    pub(crate) fn tx(&mut self) -> &mut RwTxn<'static> {
        self.txn.as_mut().expect("transaction used after commit")
    }

    #[inline]
    pub(crate) fn dbs(&self) -> &'static Dbs {
        self.dbs
    }

    #[inline]
    pub(crate) fn commit(mut self) -> Result<()> {
        match self.txn.take() {
            Some(t) => t.commit().map_err(err),
            None => Ok(()),
        }
    }

    /// Give a group a role on a project, replacing any previous role.
    /// Returns the role it replaced.
    pub fn set_grant(&mut self, project: &str, group: &str, role: Role) -> Result<Option<Role>> {
        let prev = self.dbs.grants.get(self.tx(), project, group)?;
        self.dbs.grants.put(self.tx(), project, group, role.as_str())?;
        Ok(prev.and_then(|r| r.parse().ok()))
    }

    /// Remove a group's grant on a project
    #[inline]
    pub fn revoke_grant(&mut self, project: &str, group: &str) -> Result<bool> {
        self.dbs.grants.del(self.tx(), project, group)
    }

    /// Remove every grant on a project. Returns how many were removed.
    pub fn purge_project(&mut self, project: &str) -> Result<usize> {
        let groups = self.dbs.grants.list_fwd(self.tx(), project)?;
        for (group, _) in &groups {
            self.dbs.grants.del(self.tx(), project, group)?;
        }
        Ok(groups.len())
    }
}

/// Run multiple operations in a single transaction
#[inline]
pub fn transact<T, F: FnOnce(&mut Tx) -> Result<T>>(f: F) -> Result<T> {
    let mut tx = Tx::new()?;
    let r = f(&mut tx)?;
    tx.commit()?;
    Ok(r)
}
