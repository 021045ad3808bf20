//! Ingestion and reconstruction for Strata.
//!
//! [`StrataEngine`] orchestrates the full pipeline over injected
//! dependencies: plan chunks, hash and persist them, build the Merkle
//! tree, write the origin manifest and lineage records, and later
//! reconstruct the file, either progressively into a [`MediaSink`] or as
//! one contiguous blob.

mod cancel;
mod engine;
mod error;
mod ingest;
mod media;
mod reconstruct;
mod source;

#[cfg(test)]
mod tests;

pub use cancel::CancelToken;
pub use engine::{DEFAULT_BASE_CHUNK_BYTES, EngineConfig, StrataEngine};
pub use error::EngineError;
pub use ingest::{IngestReceipt, media_hint_for};
pub use media::{BufferSink, MediaSink, SinkError};
pub use reconstruct::ReconstructOutcome;
pub use source::{ByteSource, MemorySource};
