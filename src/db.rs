//! Database types and global state

use std::borrow::Cow;
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};

use crate::error::{err, Error, Result};

/// `left/right` -> role name
pub type Db = Database<Str, Str>;

/// Escape the key separator. Only allocates when needed.
pub fn escape(s: &str) -> Cow<'_, str> {
    if s.contains('/') || s.contains('\\') {
        Cow::Owned(s.replace('\\', "\\\\").replace('/', "\\/"))
    } else {
        Cow::Borrowed(s)
    }
}

pub fn unescape(s: &str) -> Cow<'_, str> {
    if s.contains('\\') {
        Cow::Owned(s.replace("\\/", "/").replace("\\\\", "\\"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Build a two-part key
#[inline]
pub fn key(a: &str, b: &str) -> String {
    format!("{}/{}", escape(a), escape(b))
}

/// Split a two-part key at its first unescaped `/`
pub fn split_key(k: &str) -> Option<(String, String)> {
    let mut escaped = false;
    for (i, c) in k.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '/' => return Some((unescape(&k[..i]).into_owned(), unescape(&k[i + 1..]).into_owned())),
            _ => {}
        }
    }
    None
}

/// Bidirectional index: fwd[a/b] and rev[b/a] stay in sync
pub struct BiPair {
    pub fwd: Db,
    pub rev: Db,
}

impl BiPair {
    #[inline]
    pub fn get(&self, tx: &RoTxn, a: &str, b: &str) -> Result<Option<String>> {
        Ok(self.fwd.get(tx, &key(a, b)).map_err(err)?.map(str::to_string))
    }

    #[inline]
    pub fn put(&self, tx: &mut RwTxn, a: &str, b: &str, v: &str) -> Result<()> {
        self.fwd.put(tx, &key(a, b), v).map_err(err)?;
        self.rev.put(tx, &key(b, a), v).map_err(err)
    }

    #[inline]
    pub fn del(&self, tx: &mut RwTxn, a: &str, b: &str) -> Result<bool> {
        let r = self.fwd.delete(tx, &key(a, b)).map_err(err)?;
        self.rev.delete(tx, &key(b, a)).map_err(err)?;
        Ok(r)
    }

    pub fn list_fwd(&self, tx: &RoTxn, a: &str) -> Result<Vec<(String, String)>> {
        Self::list_pfx(tx, &self.fwd, a)
    }

    pub fn list_rev(&self, tx: &RoTxn, b: &str) -> Result<Vec<(String, String)>> {
        Self::list_pfx(tx, &self.rev, b)
    }

    fn list_pfx(tx: &RoTxn, db: &Db, a: &str) -> Result<Vec<(String, String)>> {
        let pfx = format!("{}/", escape(a));
        let mut r = Vec::new();
        for item in db.prefix_iter(tx, &pfx).map_err(err)? {
            let (k, v) = item.map_err(err)?;
            if let Some((_, b)) = split_key(k) {
                r.push((b, v.to_string()));
            }
        }
        Ok(r)
    }
}

/// All database handles
pub struct Dbs {
    /// project/group <-> group/project
    pub grants: BiPair,
}

// Global state
pub static ENV: OnceLock<Env> = OnceLock::new();
pub static DBS: OnceLock<Dbs> = OnceLock::new();
pub static TEST_LOCK: Mutex<()> = Mutex::new(());
pub static INIT_PATH: OnceLock<String> = OnceLock::new();

/// Get the database handles, or error if not initialized
#[inline]
pub fn dbs() -> Result<&'static Dbs> {
    DBS.get().ok_or(Error::NotInitialized)
}

/// Get the environment, or error if not initialized
#[inline]
pub fn env() -> Result<&'static Env> {
    ENV.get().ok_or(Error::NotInitialized)
}

/// Execute a read-only operation
#[inline]
pub fn read<T, F: FnOnce(&Dbs, &RoTxn) -> Result<T>>(f: F) -> Result<T> {
    f(dbs()?, &env()?.read_txn().map_err(err)?)
}

/// Initialize the database. Re-initializing at the same path is a no-op.
pub fn init(path: &str) -> Result<()> {
    if let Some(p) = INIT_PATH.get() {
        return if p == path { Ok(()) } else { Err(Error::AlreadyInitialized(p.clone())) };
    }
    std::fs::create_dir_all(path).map_err(err)?;
    // SAFETY: LMDB requires no other processes access this path concurrently during open.
    let e = unsafe {
        EnvOpenOptions::new()
            .map_size(1 << 30)
            .max_dbs(2)
            .open(Path::new(path))
            .map_err(err)?
    };
    let mut tx = e.write_txn().map_err(err)?;
    let d = Dbs {
        grants: BiPair {
            fwd: e.create_database(&mut tx, Some("grants")).map_err(err)?,
            rev: e.create_database(&mut tx, Some("grants_rev")).map_err(err)?,
        },
    };
    tx.commit().map_err(err)?;
    let _ = (ENV.set(e), DBS.set(d), INIT_PATH.set(path.to_string()));
    tracing::debug!(path, "grant store opened");
    Ok(())
}

/// Clear all databases (for testing)
pub fn clear_all() -> Result<()> {
    crate::tx::transact(|tx| {
        let d = tx.dbs();
        d.grants.fwd.clear(tx.tx()).map_err(err)?;
        d.grants.rev.clear(tx.tx()).map_err(err)
    })
}

/// Get the test lock (for single-threaded tests)
pub fn test_lock() -> std::sync::MutexGuard<'static, ()> {
    TEST_LOCK.lock().unwrap_or_else(|p| p.into_inner())
}
