//! Engine construction and shared plumbing.

use std::sync::Arc;

use strata_cas::{ContentHasher, DEFAULT_FIB_START};
use strata_lineage::LineageSet;
use strata_store::StorageLayer;
use strata_types::ContentHash;

use crate::error::EngineError;
use crate::source::ByteSource;

/// Default chunk size for tier 0, 256 KiB.
pub const DEFAULT_BASE_CHUNK_BYTES: u64 = 256 * 1024;

/// Slice size used when streaming the whole-file hash.
const STREAM_SLICE_BYTES: u64 = 1024 * 1024;

/// Tunables for a [`StrataEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Chunk size at tier 0. Deeper tiers scale it by the Fibonacci
    /// progression.
    pub base_chunk_bytes: u64,
    /// First two terms of the Fibonacci progression.
    pub fib_start: [u64; 2],
    /// Verify chunk hashes and Merkle proofs during reconstruction.
    pub strict: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_chunk_bytes: DEFAULT_BASE_CHUNK_BYTES,
            fib_start: DEFAULT_FIB_START,
            strict: true,
        }
    }
}

/// Orchestrates ingestion and reconstruction over an injected storage
/// layer and content hasher.
pub struct StrataEngine {
    storage: StorageLayer,
    hasher: Arc<dyn ContentHasher>,
    config: EngineConfig,
}

impl StrataEngine {
    pub fn new(config: EngineConfig, storage: StorageLayer, hasher: Arc<dyn ContentHasher>) -> Self {
        Self {
            storage,
            hasher,
            config,
        }
    }

    pub fn storage(&self) -> &StorageLayer {
        &self.storage
    }

    pub fn hasher(&self) -> &dyn ContentHasher {
        &*self.hasher
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Load every persisted lineage entry for an origin into a set.
    pub async fn load_lineage(&self, origin: &ContentHash) -> LineageSet {
        LineageSet::from_entries(self.storage.load_lineage(origin).await)
    }

    /// Hash the whole source in fixed slices, independent of the chunk
    /// plan.
    pub(crate) async fn hash_source(&self, source: &dyn ByteSource) -> Result<ContentHash, EngineError> {
        let mut state = self.hasher.begin();
        let total = source.byte_length();
        let mut offset = 0u64;
        while offset < total {
            let take = STREAM_SLICE_BYTES.min(total - offset);
            let bytes = source.slice(offset, take).await?;
            state.update(&bytes);
            offset += take;
        }
        Ok(state.finalize())
    }
}
