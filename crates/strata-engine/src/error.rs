//! Error types for the engine.

use crate::media::SinkError;

/// Errors that can occur during ingestion or reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Content addressing / hashing error.
    #[error("cas error: {0}")]
    Cas(#[from] strata_cas::CasError),

    /// Storage layer error.
    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// Byte source I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Media sink error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    /// Full-blob reconstruction found no usable entry for a required
    /// chunk. There is no safe partial result, so the attempt fails.
    #[error("incomplete lineage: no usable entry for chunk t{tier}/i{index}")]
    IncompleteLineage {
        /// Tier of the missing chunk.
        tier: u32,
        /// Index of the missing chunk within its tier.
        index: u32,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,
}
