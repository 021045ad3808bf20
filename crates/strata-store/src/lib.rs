//! Key-value storage for Strata.
//!
//! Two pieces:
//! - [`KvStore`] — a flat async key→bytes store addressed by path-like
//!   string keys, with in-memory ([`MemoryKv`]), persistent ([`FjallKv`]),
//!   and latency-injecting ([`SlowKv`]) implementations.
//! - [`StorageLayer`] — the three Strata namespaces (`origin/`,
//!   `lineage/`, `blobs/`) over an injected `KvStore`. The layer can be
//!   constructed *detached* (no persistent storage in the environment), in
//!   which case every operation degrades to a no-op or `None`.

mod error;
mod fjall_kv;
mod layer;
mod memory_kv;
mod slow_kv;
mod traits;

pub use error::StoreError;
pub use fjall_kv::FjallKv;
pub use layer::{BlobRecord, StorageLayer, blob_key, lineage_key, lineage_prefix, origin_key};
pub use memory_kv::MemoryKv;
pub use slow_kv::SlowKv;
pub use traits::KvStore;
