//! Reconstruction of an origin file from its lineage.
//!
//! Two paths, chosen per call:
//! - streaming: chunks are appended to a [`MediaSink`] in planner order
//!   as they become available; unusable chunks are skipped so playback
//!   can start from whatever is present.
//! - full blob: every chunk is required, the file is reassembled
//!   contiguously and delivered to the sink in one append.

use bytes::Bytes;
use strata_cas::{leaf_hash, plan_chunks, verify_proof};
use strata_lineage::LineageSet;
use strata_types::{ChunkPlan, LineageKey, OriginManifest};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::engine::StrataEngine;
use crate::error::EngineError;
use crate::media::MediaSink;

/// What a reconstruction call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconstructOutcome {
    /// Chunks were appended progressively. `skipped` counts chunks with
    /// no usable lineage entry or blob.
    Streamed { appended: usize, skipped: usize },
    /// The whole file was assembled and delivered in one append.
    Blob { byte_length: u64 },
}

impl StrataEngine {
    /// Reconstruct the file described by `manifest` into `sink`.
    ///
    /// Streams progressively when the manifest carries a media hint the
    /// sink supports; otherwise assembles the full blob, which fails
    /// unless every chunk is present and verifiable.
    pub async fn reconstruct(
        &self,
        manifest: &OriginManifest,
        lineage: &LineageSet,
        sink: &mut dyn MediaSink,
        cancel: &CancelToken,
    ) -> Result<ReconstructOutcome, EngineError> {
        if let Some(hint) = &manifest.media_hint
            && sink.supports(&hint.container)
        {
            return self.reconstruct_streaming(manifest, lineage, sink, cancel).await;
        }

        let blob = self.assemble_blob(manifest, lineage, cancel).await?;
        let byte_length = blob.len() as u64;
        sink.open(&manifest.mime).await?;
        sink.append(Bytes::from(blob)).await?;
        sink.close().await?;
        info!(file_hash = %manifest.file_hash, byte_length, "reconstructed full blob");
        Ok(ReconstructOutcome::Blob { byte_length })
    }

    /// Assemble the complete file from storage.
    ///
    /// Chunk fetches run concurrently; assembly orders them by offset, so
    /// the output is deterministic regardless of fetch completion order.
    /// Any chunk that is missing or fails verification aborts the whole
    /// attempt with [`EngineError::IncompleteLineage`].
    pub async fn assemble_blob(
        &self,
        manifest: &OriginManifest,
        lineage: &LineageSet,
        cancel: &CancelToken,
    ) -> Result<Vec<u8>, EngineError> {
        let layout = plan_chunks(
            manifest.byte_length,
            manifest.chunking.base_chunk_bytes,
            manifest.chunking.fib_start,
        );

        let fetches = layout.plan.iter().map(|chunk| async move {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }
            let missing = || EngineError::IncompleteLineage {
                tier: chunk.tier,
                index: chunk.index,
            };
            let entry = lineage.get(chunk.tier, chunk.index).ok_or_else(missing)?;
            let bytes = self
                .chunk_bytes_checked(manifest, chunk, entry)
                .await
                .ok_or_else(missing)?;
            Ok::<(u64, Bytes), EngineError>((chunk.offset, bytes))
        });
        let mut parts = futures::future::try_join_all(fetches).await?;
        parts.sort_by_key(|(offset, _)| *offset);

        let mut out = Vec::with_capacity(manifest.byte_length as usize);
        for (_, bytes) in parts {
            out.extend_from_slice(&bytes);
        }
        Ok(out)
    }

    async fn reconstruct_streaming(
        &self,
        manifest: &OriginManifest,
        lineage: &LineageSet,
        sink: &mut dyn MediaSink,
        cancel: &CancelToken,
    ) -> Result<ReconstructOutcome, EngineError> {
        let layout = plan_chunks(
            manifest.byte_length,
            manifest.chunking.base_chunk_bytes,
            manifest.chunking.fib_start,
        );
        sink.open(&manifest.mime).await?;

        let mut appended = 0usize;
        let mut skipped = 0usize;
        for chunk in &layout.plan {
            if cancel.is_cancelled() {
                sink.close().await?;
                return Err(EngineError::Cancelled);
            }
            let Some(entry) = lineage.get(chunk.tier, chunk.index) else {
                debug!(tier = chunk.tier, index = chunk.index, "no lineage entry, skipping chunk");
                skipped += 1;
                continue;
            };
            match self.chunk_bytes_checked(manifest, chunk, entry).await {
                Some(bytes) => {
                    // Appends stay strictly sequential; the sink never sees
                    // overlapping writes.
                    sink.append(bytes).await?;
                    appended += 1;
                }
                None => skipped += 1,
            }
        }

        sink.close().await?;
        info!(
            file_hash = %manifest.file_hash,
            appended,
            skipped,
            "streaming reconstruction finished"
        );
        Ok(ReconstructOutcome::Streamed { appended, skipped })
    }

    /// Fetch one chunk's bytes, verifying them in strict mode.
    ///
    /// `None` means the chunk is unusable for any reason: the lineage
    /// entry disagrees with the plan, the blob is absent, the bytes no
    /// longer match their hash, or the proof does not resolve to the
    /// manifest root. Callers treat all of these as "chunk absent".
    async fn chunk_bytes_checked(
        &self,
        manifest: &OriginManifest,
        chunk: &ChunkPlan,
        entry: &LineageKey,
    ) -> Option<Bytes> {
        if entry.chunk_byte_offset != chunk.offset
            || entry.chunk_byte_length != chunk.length
            || entry.merkle.leaf_index != chunk.leaf_index
        {
            warn!(
                tier = chunk.tier,
                index = chunk.index,
                "lineage entry disagrees with the chunk plan, skipping"
            );
            return None;
        }

        let record = self.storage().get_blob(&entry.chunk_hash).await?;
        let bytes = Bytes::from(record.bytes);

        if self.config().strict {
            if self.hasher().hash(&bytes) != entry.chunk_hash {
                warn!(
                    chunk_hash = %entry.chunk_hash,
                    "stored blob does not match its content hash, skipping"
                );
                return None;
            }
            let leaf = leaf_hash(self.hasher(), &entry.chunk_hash);
            if entry.merkle.root != manifest.merkle.root
                || !verify_proof(
                    self.hasher(),
                    &leaf,
                    entry.merkle.leaf_index,
                    &entry.merkle.proof,
                    &manifest.merkle.root,
                )
            {
                warn!(
                    chunk_hash = %entry.chunk_hash,
                    leaf_index = entry.merkle.leaf_index,
                    "merkle proof does not resolve to the manifest root, skipping"
                );
                return None;
            }
        }

        Some(bytes)
    }
}
