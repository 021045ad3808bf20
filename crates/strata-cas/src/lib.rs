//! Content addressing primitives for Strata.
//!
//! This crate provides:
//! - [`ContentHasher`] — pluggable fixed-width hashing with an incremental
//!   state and an [`AsyncRead`](tokio::io::AsyncRead) streaming front end.
//! - [`plan_chunks`] — derives Fibonacci-tiered chunk boundaries for a
//!   byte range.
//! - [`build_merkle`] / [`verify_proof`] — binary Merkle tree over chunk
//!   leaf hashes with per-leaf inclusion proofs.

mod error;
mod hasher;
mod merkle;
mod planner;

pub use error::CasError;
pub use hasher::{Blake3Hasher, ContentHasher, HashState, Sha256Hasher, hash_stream};
pub use merkle::{MerkleTree, build_merkle, leaf_hash, verify_proof};
pub use planner::{ChunkLayout, DEFAULT_FIB_START, FIB_TERMS, fibonacci, plan_chunks};
