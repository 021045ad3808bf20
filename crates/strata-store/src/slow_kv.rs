//! A [`KvStore`] wrapper that adds configurable random IO latency.
//!
//! `SlowKv` wraps any `Arc<dyn KvStore>` and sleeps for a random duration
//! before each read or write. The RNG is seeded for deterministic,
//! reproducible behaviour across test runs.

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::StoreError;
use crate::traits::KvStore;

/// A [`KvStore`] wrapper that injects random latency before IO operations.
///
/// Useful for tests that need real suspension points — e.g. checking that
/// streaming reconstruction never overlaps appends even when blob reads
/// resolve at uneven speeds.
pub struct SlowKv {
    inner: Arc<dyn KvStore>,
    read_latency_ms: (u64, u64),
    write_latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
}

impl SlowKv {
    /// Wrap an existing store with zero latency (pass-through) by default.
    pub fn new(inner: Arc<dyn KvStore>) -> Self {
        Self {
            inner,
            read_latency_ms: (0, 0),
            write_latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
        }
    }

    /// Set the read latency range in milliseconds (uniform random).
    pub fn read_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.read_latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the write latency range in milliseconds (uniform random).
    pub fn write_latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.write_latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the RNG seed for deterministic behaviour.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Sleep for a random duration in `[min, max]` milliseconds.
    async fn delay(&self, range: (u64, u64)) {
        let (min, max) = range;

        if max == 0 {
            return;
        }

        let ms = if min == max {
            min
        } else {
            self.rng.lock().unwrap().random_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl KvStore for SlowKv {
    async fn put(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
        self.inner.put(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.get(key).await
    }

    async fn contains(&self, key: &str) -> Result<bool, StoreError> {
        self.delay(self.read_latency_ms).await;
        self.inner.contains(key).await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.list_prefix(prefix).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.delay(self.write_latency_ms).await;
        self.inner.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_kv::MemoryKv;

    #[tokio::test]
    async fn test_passthrough_semantics() {
        let slow = SlowKv::new(Arc::new(MemoryKv::new())).seed(7);
        slow.put("k", Bytes::from_static(b"v")).await.unwrap();
        assert_eq!(slow.get("k").await.unwrap(), Some(Bytes::from_static(b"v")));
        assert!(slow.contains("k").await.unwrap());
        slow.delete("k").await.unwrap();
        assert_eq!(slow.get("k").await.unwrap(), None);
    }
}
