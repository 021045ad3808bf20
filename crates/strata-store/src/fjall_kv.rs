//! Persistent key-value backend wrapping a Fjall keyspace.

use std::path::Path;

use bytes::Bytes;
use fjall::{Database, Keyspace, KeyspaceCreateOptions};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::KvStore;

/// Persistent store backed by Fjall.
///
/// All Strata namespaces share one keyspace; the path-like key strings
/// already carry the namespace prefix, and Fjall's ordered prefix scans
/// give namespace listing for free.
pub struct FjallKv {
    /// The underlying Fjall database handle.
    #[allow(dead_code)]
    db: Database,
    /// Every record, keyed by its namespaced path string.
    records: Keyspace,
}

impl FjallKv {
    /// Open a persistent store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = Database::builder(path).open()?;
        Self::init(db)
    }

    /// Open a temporary store that is cleaned up on drop.
    ///
    /// Useful for tests.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let tmp = tempfile::tempdir().map_err(std::io::Error::other)?;
        let db = Database::builder(tmp.path()).temporary(true).open()?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, StoreError> {
        let records = db.keyspace("records", KeyspaceCreateOptions::default)?;
        Ok(Self { db, records })
    }
}

#[async_trait::async_trait]
impl KvStore for FjallKv {
    async fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.records.insert(key.as_bytes(), value.as_ref())?;
        debug!(key, size = value.len(), "stored record");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        match self.records.get(key.as_bytes())? {
            Some(value) => Ok(Some(Bytes::copy_from_slice(value.as_ref()))),
            None => Ok(None),
        }
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(key.as_bytes())?)
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for guard in self.records.prefix(prefix.as_bytes()) {
            let key = guard.key()?;
            if let Ok(key) = std::str::from_utf8(&key) {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.records.remove(key.as_bytes())?;
        debug!(key, "deleted record");
        Ok(())
    }
}
