//! In-memory key-value backend.

use std::collections::BTreeMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::traits::KvStore;

/// In-memory store backed by a `RwLock<BTreeMap>`.
///
/// Useful for tests and for environments without persistent storage that
/// still want a working (session-scoped) store. The ordered map makes
/// prefix listing trivial.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryKv {
    /// Create an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryKv {
    async fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        debug!(key, size = value.len(), "storing value in memory");
        let mut map = self.entries.write().expect("lock poisoned");
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let map = self.entries.read().expect("lock poisoned");
        Ok(map
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut map = self.entries.write().expect("lock poisoned");
        map.remove(key);
        debug!(key, "deleted value from memory");
        Ok(())
    }
}
