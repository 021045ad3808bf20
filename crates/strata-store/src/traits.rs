//! Core trait for key-value storage backends.

use bytes::Bytes;

use crate::error::StoreError;

/// A flat key→bytes store addressed by path-like string keys.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Values are passed as [`Bytes`] to enable zero-copy transfers through
/// the pipeline. The store is append-mostly: Strata keys are
/// content-addressed, so concurrent writers storing the same key always
/// store the same value.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    /// Store a value under the given key, replacing any existing value.
    async fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError>;

    /// Retrieve a value by key. Returns `None` if not found.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Check whether a key exists.
    async fn contains(&self, key: &str) -> Result<bool, StoreError>;

    /// List all keys starting with `prefix`, in lexicographic order.
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Delete a key. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
