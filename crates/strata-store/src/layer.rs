//! [`StorageLayer`] — the three Strata namespaces over a [`KvStore`].
//!
//! Key formats are a stable contract:
//! - `origin/<fileHash>` → manifest JSON
//! - `lineage/<fileHash>/t<tier>/i<index>` → lineage JSON
//! - `blobs/<chunkHash>` → postcard blob envelope (raw bytes + MIME)
//!
//! Reads return `None` when a record is absent, undecodable, or fails
//! boundary validation — they never propagate an error. The layer itself
//! may be *detached* (no storage available in the environment), in which
//! case writes are no-ops and reads are `None`; callers degrade instead
//! of failing.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use strata_cas::plan_chunks;
use strata_types::{ContentHash, LineageKey, OriginManifest};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::traits::KvStore;

/// Storage key for an origin manifest.
pub fn origin_key(file_hash: &ContentHash) -> String {
    format!("origin/{file_hash}")
}

/// Storage key for one chunk's lineage record.
pub fn lineage_key(file_hash: &ContentHash, tier: u32, index: u32) -> String {
    format!("lineage/{file_hash}/t{tier}/i{index}")
}

/// Prefix covering all lineage records of one origin.
pub fn lineage_prefix(file_hash: &ContentHash) -> String {
    format!("lineage/{file_hash}/")
}

/// Storage key for a chunk payload blob.
pub fn blob_key(chunk_hash: &ContentHash) -> String {
    format!("blobs/{chunk_hash}")
}

/// Raw chunk bytes plus their content type.
///
/// Stored postcard-encoded: blob payloads are opaque binary and would
/// only bloat as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    /// Content type of the bytes (usually the origin file's MIME).
    pub mime: String,
    /// The chunk's raw bytes.
    pub bytes: Vec<u8>,
}

/// The three-namespace storage layer.
///
/// Holds an injected [`KvStore`] rather than reaching for ambient global
/// state; tests plug in [`MemoryKv`](crate::MemoryKv), deployments plug
/// in [`FjallKv`](crate::FjallKv), and environments without storage use
/// [`StorageLayer::detached`].
#[derive(Clone)]
pub struct StorageLayer {
    kv: Option<Arc<dyn KvStore>>,
}

impl StorageLayer {
    /// Create a layer over the given backend.
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv: Some(kv) }
    }

    /// Create a layer with no backend; every operation degrades.
    pub fn detached() -> Self {
        Self { kv: None }
    }

    /// Whether a backend is attached.
    pub fn is_available(&self) -> bool {
        self.kv.is_some()
    }

    // ----- Origin manifests -----

    /// Persist a manifest under `origin/<fileHash>`. No-op when detached.
    pub async fn put_manifest(&self, manifest: &OriginManifest) -> Result<(), StoreError> {
        let Some(kv) = &self.kv else {
            debug!("storage detached, dropping manifest write");
            return Ok(());
        };
        let json = serde_json::to_vec(manifest)?;
        kv.put(&origin_key(&manifest.file_hash), Bytes::from(json))
            .await?;
        debug!(file_hash = %manifest.file_hash, "stored manifest");
        Ok(())
    }

    /// Read and validate a manifest. `None` if absent, undecodable, or
    /// inconsistent with its own chunking parameters.
    pub async fn get_manifest(&self, file_hash: &ContentHash) -> Option<OriginManifest> {
        let bytes = self.read(&origin_key(file_hash)).await?;

        let manifest: OriginManifest = match serde_json::from_slice(&bytes) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(%file_hash, error = %e, "undecodable manifest, treating as absent");
                return None;
            }
        };

        if let Err(e) = manifest.validate() {
            warn!(%file_hash, error = %e, "manifest failed validation, treating as absent");
            return None;
        }

        // The lineage index must agree with a re-derived plan; a tampered
        // index would otherwise misdirect reconstruction.
        let layout = plan_chunks(
            manifest.byte_length,
            manifest.chunking.base_chunk_bytes,
            manifest.chunking.fib_start,
        );
        if layout.tiers != manifest.lineage_index
            || layout.plan.len() as u64 != manifest.merkle.leaf_count
        {
            warn!(%file_hash, "manifest lineage index does not match derived plan");
            return None;
        }

        Some(manifest)
    }

    // ----- Lineage keys -----

    /// Persist one chunk's lineage record. No-op when detached.
    pub async fn put_lineage(&self, key: &LineageKey) -> Result<(), StoreError> {
        let Some(kv) = &self.kv else {
            debug!("storage detached, dropping lineage write");
            return Ok(());
        };
        let json = serde_json::to_vec(key)?;
        kv.put(
            &lineage_key(&key.origin_key_ref, key.tier, key.chunk_index),
            Bytes::from(json),
        )
        .await?;
        Ok(())
    }

    /// Read one chunk's lineage record.
    pub async fn get_lineage(
        &self,
        file_hash: &ContentHash,
        tier: u32,
        index: u32,
    ) -> Option<LineageKey> {
        let bytes = self.read(&lineage_key(file_hash, tier, index)).await?;
        self.decode_lineage(file_hash, &bytes)
    }

    /// Load every persisted lineage record for an origin.
    ///
    /// Undecodable entries are skipped; order is whatever the backend's
    /// prefix scan yields (callers sort by (tier, index) themselves).
    pub async fn load_lineage(&self, file_hash: &ContentHash) -> Vec<LineageKey> {
        let Some(kv) = &self.kv else {
            return Vec::new();
        };
        let keys = match kv.list_prefix(&lineage_prefix(file_hash)).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(%file_hash, error = %e, "lineage scan failed");
                return Vec::new();
            }
        };

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(bytes) = self.read(&key).await {
                if let Some(entry) = self.decode_lineage(file_hash, &bytes) {
                    entries.push(entry);
                }
            }
        }
        entries
    }

    fn decode_lineage(&self, file_hash: &ContentHash, bytes: &[u8]) -> Option<LineageKey> {
        match serde_json::from_slice::<LineageKey>(bytes) {
            Ok(entry) if entry.origin_key_ref == *file_hash => Some(entry),
            Ok(entry) => {
                warn!(
                    %file_hash,
                    found = %entry.origin_key_ref,
                    "lineage record references a different origin, skipping"
                );
                None
            }
            Err(e) => {
                warn!(%file_hash, error = %e, "undecodable lineage record, skipping");
                None
            }
        }
    }

    // ----- Blobs -----

    /// Persist chunk bytes under their content hash. No-op when detached.
    ///
    /// Identical bytes anywhere collapse to one stored blob, so callers
    /// may skip the write when [`has_blob`](Self::has_blob) is true.
    pub async fn put_blob(
        &self,
        chunk_hash: &ContentHash,
        mime: &str,
        bytes: Bytes,
    ) -> Result<(), StoreError> {
        let Some(kv) = &self.kv else {
            debug!("storage detached, dropping blob write");
            return Ok(());
        };
        let record = BlobRecord {
            mime: mime.to_string(),
            bytes: bytes.to_vec(),
        };
        let encoded = postcard::to_allocvec(&record)?;
        kv.put(&blob_key(chunk_hash), Bytes::from(encoded)).await?;
        Ok(())
    }

    /// Whether a blob with these bytes is already stored.
    pub async fn has_blob(&self, chunk_hash: &ContentHash) -> bool {
        let Some(kv) = &self.kv else {
            return false;
        };
        match kv.contains(&blob_key(chunk_hash)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(%chunk_hash, error = %e, "blob existence check failed");
                false
            }
        }
    }

    /// Read a blob's bytes and content type.
    pub async fn get_blob(&self, chunk_hash: &ContentHash) -> Option<BlobRecord> {
        let bytes = self.read(&blob_key(chunk_hash)).await?;
        match postcard::from_bytes(&bytes) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(%chunk_hash, error = %e, "undecodable blob envelope, treating as absent");
                None
            }
        }
    }

    /// Backend read that never propagates an error.
    async fn read(&self, key: &str) -> Option<Bytes> {
        let kv = self.kv.as_ref()?;
        match kv.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating as absent");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_kv::MemoryKv;
    use strata_cas::{Blake3Hasher, ContentHasher, build_merkle, leaf_hash};
    use strata_types::{
        CapsuleBinding, ChunkingParams, LeafProof, MANIFEST_VERSION, MerkleSummary,
    };

    fn attached() -> StorageLayer {
        StorageLayer::new(Arc::new(MemoryKv::new()))
    }

    /// Build a structurally valid manifest for `data` using the real
    /// planner and merkle builder.
    fn manifest_for(data: &[u8], base: u64) -> OriginManifest {
        let hasher = Blake3Hasher;
        let layout = plan_chunks(data.len() as u64, base, [1, 2]);
        let leaves: Vec<ContentHash> = layout
            .plan
            .iter()
            .map(|c| {
                let chunk = &data[c.offset as usize..(c.offset + c.length) as usize];
                leaf_hash(&hasher, &hasher.hash(chunk))
            })
            .collect();
        let tree = build_merkle(&hasher, &leaves);
        let file_hash = hasher.hash(data);
        let chunking = ChunkingParams {
            base_chunk_bytes: base,
            fib_start: [1, 2],
            max_tier: layout.max_tier(),
        };
        OriginManifest {
            version: MANIFEST_VERSION,
            file_name: "data.bin".to_string(),
            mime: "application/octet-stream".to_string(),
            byte_length: data.len() as u64,
            file_hash,
            chunking,
            merkle: MerkleSummary {
                root: tree.root,
                leaf_count: leaves.len() as u64,
            },
            lineage_index: layout.tiers.clone(),
            media_hint: None,
            capsule: CapsuleBinding {
                file_hash,
                byte_length: data.len() as u64,
                chunking,
                merkle_root: tree.root,
            },
        }
    }

    fn lineage_entry(manifest: &OriginManifest, tier: u32, index: u32) -> LineageKey {
        let chunk_hash = ContentHash::from_data(format!("chunk-{tier}-{index}").as_bytes());
        LineageKey {
            origin_key_ref: manifest.file_hash,
            tier,
            chunk_index: index,
            chunk_byte_offset: 0,
            chunk_byte_length: 1,
            chunk_hash,
            merkle: LeafProof {
                leaf_index: 0,
                proof: vec![],
                root: manifest.merkle.root,
            },
            provenance: "ingest".to_string(),
            payload: blob_key(&chunk_hash),
        }
    }

    #[tokio::test]
    async fn test_manifest_roundtrip() {
        let layer = attached();
        let manifest = manifest_for(&[0xAB; 500], 100);
        layer.put_manifest(&manifest).await.unwrap();
        let back = layer.get_manifest(&manifest.file_hash).await.unwrap();
        assert_eq!(back, manifest);
    }

    #[tokio::test]
    async fn test_get_manifest_absent() {
        let layer = attached();
        let missing = ContentHash::from_data(b"no such file");
        assert!(layer.get_manifest(&missing).await.is_none());
    }

    #[tokio::test]
    async fn test_get_manifest_rejects_garbage_json() {
        let kv = Arc::new(MemoryKv::new());
        let layer = StorageLayer::new(kv.clone());
        let hash = ContentHash::from_data(b"garbled");
        kv.put(&origin_key(&hash), Bytes::from_static(b"{not json"))
            .await
            .unwrap();
        assert!(layer.get_manifest(&hash).await.is_none());
    }

    #[tokio::test]
    async fn test_get_manifest_rejects_tampered_lineage_index() {
        let kv = Arc::new(MemoryKv::new());
        let layer = StorageLayer::new(kv.clone());
        let mut manifest = manifest_for(&[0xCD; 500], 100);

        // Inflate a tier's chunk size; structural coverage still holds but
        // the index no longer matches the derived plan.
        manifest.lineage_index[0].chunk_bytes = 120;
        manifest.lineage_index[0].count = 2;
        let json = serde_json::to_vec(&manifest).unwrap();
        kv.put(&origin_key(&manifest.file_hash), Bytes::from(json))
            .await
            .unwrap();

        assert!(layer.get_manifest(&manifest.file_hash).await.is_none());
    }

    #[tokio::test]
    async fn test_get_manifest_degrades_on_zero_chunking_params() {
        let kv = Arc::new(MemoryKv::new());
        let layer = StorageLayer::new(kv.clone());
        let mut manifest = manifest_for(&[0xEF; 500], 100);

        // A zero base would trip the planner's assert during plan
        // re-derivation; the read must come back absent instead.
        manifest.chunking.base_chunk_bytes = 0;
        manifest.capsule.chunking.base_chunk_bytes = 0;
        let json = serde_json::to_vec(&manifest).unwrap();
        kv.put(&origin_key(&manifest.file_hash), Bytes::from(json))
            .await
            .unwrap();

        assert!(layer.get_manifest(&manifest.file_hash).await.is_none());
    }

    #[tokio::test]
    async fn test_lineage_roundtrip_and_scan() {
        let layer = attached();
        let manifest = manifest_for(&[1; 300], 100);
        for (tier, index) in [(0u32, 0u32), (0, 1), (1, 0)] {
            layer
                .put_lineage(&lineage_entry(&manifest, tier, index))
                .await
                .unwrap();
        }

        let one = layer.get_lineage(&manifest.file_hash, 0, 1).await.unwrap();
        assert_eq!((one.tier, one.chunk_index), (0, 1));

        let all = layer.load_lineage(&manifest.file_hash).await;
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_load_lineage_skips_undecodable() {
        let kv = Arc::new(MemoryKv::new());
        let layer = StorageLayer::new(kv.clone());
        let manifest = manifest_for(&[2; 300], 100);
        layer
            .put_lineage(&lineage_entry(&manifest, 0, 0))
            .await
            .unwrap();
        kv.put(
            &lineage_key(&manifest.file_hash, 0, 1),
            Bytes::from_static(b"corrupt"),
        )
        .await
        .unwrap();

        let all = layer.load_lineage(&manifest.file_hash).await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_blob_roundtrip_and_dedup_check() {
        let layer = attached();
        let bytes = Bytes::from_static(b"payload bytes");
        let hash = ContentHash::from_data(&bytes);

        assert!(!layer.has_blob(&hash).await);
        layer.put_blob(&hash, "video/mp4", bytes.clone()).await.unwrap();
        assert!(layer.has_blob(&hash).await);

        let record = layer.get_blob(&hash).await.unwrap();
        assert_eq!(record.mime, "video/mp4");
        assert_eq!(record.bytes, bytes.to_vec());
    }

    #[tokio::test]
    async fn test_detached_layer_degrades() {
        let layer = StorageLayer::detached();
        assert!(!layer.is_available());

        let manifest = manifest_for(&[3; 200], 100);
        // Writes succeed as no-ops, reads come back empty.
        layer.put_manifest(&manifest).await.unwrap();
        assert!(layer.get_manifest(&manifest.file_hash).await.is_none());

        let hash = ContentHash::from_data(b"blob");
        layer
            .put_blob(&hash, "text/plain", Bytes::from_static(b"blob"))
            .await
            .unwrap();
        assert!(!layer.has_blob(&hash).await);
        assert!(layer.get_blob(&hash).await.is_none());
        assert!(layer.load_lineage(&manifest.file_hash).await.is_empty());
    }
}
