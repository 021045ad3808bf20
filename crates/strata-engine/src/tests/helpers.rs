//! Shared test utilities for strata-engine tests.

use std::sync::Arc;

use strata_cas::Blake3Hasher;
use strata_store::{KvStore, MemoryKv, StorageLayer};
use strata_types::OriginManifest;

use crate::engine::{EngineConfig, StrataEngine};
use crate::ingest::IngestReceipt;
use crate::source::MemorySource;

/// Small tier-0 size so modest test payloads span several tiers.
pub const TEST_BASE_CHUNK: u64 = 64;

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Engine over a fresh in-memory store, returning the raw kv for
/// inspection.
pub fn memory_engine() -> (StrataEngine, Arc<MemoryKv>) {
    let kv = Arc::new(MemoryKv::new());
    (engine_over(kv.clone()), kv)
}

/// Engine over an arbitrary backend.
pub fn engine_over(kv: Arc<dyn KvStore>) -> StrataEngine {
    StrataEngine::new(
        EngineConfig {
            base_chunk_bytes: TEST_BASE_CHUNK,
            ..EngineConfig::default()
        },
        StorageLayer::new(kv),
        Arc::new(Blake3Hasher),
    )
}

/// Ingest bytes and read back the stored manifest.
pub async fn ingest_bytes(
    engine: &StrataEngine,
    name: &str,
    mime: &str,
    data: &[u8],
) -> (IngestReceipt, OriginManifest) {
    let source = MemorySource::new(name, mime, data.to_vec());
    let receipt = engine
        .ingest(&source)
        .await
        .unwrap()
        .expect("storage is attached");
    let manifest = engine
        .storage()
        .get_manifest(&receipt.origin_sig)
        .await
        .expect("manifest was just written");
    (receipt, manifest)
}
