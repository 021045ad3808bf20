//! Single-file ingestion pipeline.
//!
//! Plan chunks, hash and persist each chunk, build the Merkle tree,
//! compute the whole-file hash in an independent streaming pass, then
//! write the manifest and one lineage record per chunk.

use strata_cas::{build_merkle, leaf_hash, plan_chunks};
use strata_store::{blob_key, origin_key};
use strata_types::{
    CapsuleBinding, ContentHash, LeafProof, LineageKey, MANIFEST_VERSION, MediaHint,
    MerkleSummary, OriginManifest,
};
use tracing::{debug, info};

use crate::engine::StrataEngine;
use crate::error::EngineError;
use crate::source::ByteSource;

/// Provenance tag written into lineage records created by ingestion.
pub const PROVENANCE_INGEST: &str = "ingest";

/// Identity handed back to the caller after a successful ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReceipt {
    /// Storage key of the manifest (`origin/<fileHash>`).
    pub origin_url: String,
    /// The whole-file content hash.
    pub origin_sig: ContentHash,
}

/// Derive a playback hint for progressively streamable MIME types.
///
/// Every video type gets a hint; the known containers carry the baseline
/// codec profiles they are ingested with, the rest leave codec selection
/// to the sink. Non-video types get no hint and reconstruct as a full
/// blob.
pub fn media_hint_for(mime: &str) -> Option<MediaHint> {
    match mime {
        "video/mp4" => Some(MediaHint {
            container: mime.to_string(),
            codecs: "avc1.42E01E, mp4a.40.2".to_string(),
        }),
        "video/webm" => Some(MediaHint {
            container: mime.to_string(),
            codecs: "vp9, opus".to_string(),
        }),
        other if other.starts_with("video/") => Some(MediaHint {
            container: other.to_string(),
            codecs: String::new(),
        }),
        _ => None,
    }
}

impl StrataEngine {
    /// Ingest one file from a [`ByteSource`].
    ///
    /// Returns `Ok(None)` when storage is detached: nothing can be
    /// persisted, and a receipt would dangle. Ingestion is idempotent,
    /// since every written record is a pure function of the content and
    /// the chunking parameters, re-ingesting identical bytes rewrites
    /// identical records.
    pub async fn ingest(&self, source: &dyn ByteSource) -> Result<Option<IngestReceipt>, EngineError> {
        if !self.storage().is_available() {
            info!(
                file = source.file_name(),
                "storage detached, skipping ingestion"
            );
            return Ok(None);
        }

        let byte_length = source.byte_length();
        let config = self.config();
        info!(
            file = source.file_name(),
            mime = source.mime(),
            byte_length,
            "ingesting"
        );

        let layout = plan_chunks(byte_length, config.base_chunk_bytes, config.fib_start);
        debug!(
            chunks = layout.plan.len(),
            tiers = layout.tiers.len(),
            "chunk plan derived"
        );

        // Hash and persist every chunk; identical chunks collapse to one
        // stored blob.
        let mut chunk_hashes = Vec::with_capacity(layout.plan.len());
        for chunk in &layout.plan {
            let bytes = source.slice(chunk.offset, chunk.length).await?;
            let chunk_hash = self.hasher().hash(&bytes);
            if !self.storage().has_blob(&chunk_hash).await {
                self.storage()
                    .put_blob(&chunk_hash, source.mime(), bytes)
                    .await?;
            }
            chunk_hashes.push(chunk_hash);
        }

        let leaves: Vec<ContentHash> = chunk_hashes
            .iter()
            .map(|hash| leaf_hash(self.hasher(), hash))
            .collect();
        let tree = build_merkle(self.hasher(), &leaves);

        // Whole-file identity, streamed over the source rather than
        // derived from the tree: the two hashes are independent checks.
        let file_hash = self.hash_source(source).await?;

        let chunking = layout.params(config.base_chunk_bytes, config.fib_start);
        let manifest = OriginManifest {
            version: MANIFEST_VERSION,
            file_name: source.file_name().to_string(),
            mime: source.mime().to_string(),
            byte_length,
            file_hash,
            chunking,
            merkle: MerkleSummary {
                root: tree.root,
                leaf_count: leaves.len() as u64,
            },
            lineage_index: layout.tiers.clone(),
            media_hint: media_hint_for(source.mime()),
            capsule: CapsuleBinding {
                file_hash,
                byte_length,
                chunking,
                merkle_root: tree.root,
            },
        };
        self.storage().put_manifest(&manifest).await?;

        for (chunk, chunk_hash) in layout.plan.iter().zip(&chunk_hashes) {
            let entry = LineageKey {
                origin_key_ref: file_hash,
                tier: chunk.tier,
                chunk_index: chunk.index,
                chunk_byte_offset: chunk.offset,
                chunk_byte_length: chunk.length,
                chunk_hash: *chunk_hash,
                merkle: LeafProof {
                    leaf_index: chunk.leaf_index,
                    proof: tree.proofs[chunk.leaf_index as usize].clone(),
                    root: tree.root,
                },
                provenance: PROVENANCE_INGEST.to_string(),
                payload: blob_key(chunk_hash),
            };
            self.storage().put_lineage(&entry).await?;
        }

        info!(%file_hash, chunks = layout.plan.len(), "ingestion complete");
        Ok(Some(IngestReceipt {
            origin_url: origin_key(&file_hash),
            origin_sig: file_hash,
        }))
    }

    /// Re-derive both identities from the source and compare them to the
    /// manifest.
    ///
    /// `fileHash` and the Merkle root are computed by different paths and
    /// neither implies the other; this opt-in check confirms they
    /// describe the same bytes.
    pub async fn verify_consistency(
        &self,
        source: &dyn ByteSource,
        manifest: &OriginManifest,
    ) -> Result<bool, EngineError> {
        if source.byte_length() != manifest.byte_length {
            return Ok(false);
        }

        let file_hash = self.hash_source(source).await?;
        if file_hash != manifest.file_hash {
            return Ok(false);
        }

        let layout = plan_chunks(
            manifest.byte_length,
            manifest.chunking.base_chunk_bytes,
            manifest.chunking.fib_start,
        );
        let mut leaves = Vec::with_capacity(layout.plan.len());
        for chunk in &layout.plan {
            let bytes = source.slice(chunk.offset, chunk.length).await?;
            leaves.push(leaf_hash(self.hasher(), &self.hasher().hash(&bytes)));
        }
        let tree = build_merkle(self.hasher(), &leaves);
        Ok(tree.root == manifest.merkle.root)
    }
}
