//! Shared types for the Strata workspace.
//!
//! This crate defines the persisted record shapes and identifiers used
//! across Strata: the content digest ([`ContentHash`]), the per-file
//! descriptor ([`OriginManifest`]), the per-chunk proof record
//! ([`LineageKey`]), and the ephemeral chunk plan ([`ChunkPlan`]).
//!
//! Manifests and lineage keys are stored as JSON with camelCase field
//! names; those names are a stable on-disk contract and must not change.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Width of a content digest in bytes.
///
/// Every supported hash algorithm must produce digests of exactly this
/// width; anything else is rejected at the decode boundary.
pub const DIGEST_LEN: usize = 32;

/// Version tag embedded in every persisted [`OriginManifest`].
pub const MANIFEST_VERSION: u8 = 1;

// ---------------------------------------------------------------------------
// ContentHash
// ---------------------------------------------------------------------------

/// A fixed-width content digest, rendered as 64 lowercase hex characters.
///
/// Serializes as a hex string so that manifests and lineage records stay
/// human-readable JSON. Decoding validates both length and charset:
/// a digest of the wrong width is a decode error, never silently padded
/// or truncated.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ContentHash([u8; DIGEST_LEN]);

impl ContentHash {
    /// Hash arbitrary bytes with the default algorithm (BLAKE3).
    pub fn from_data(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Return the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Render the digest as lowercase hex.
    pub fn to_hex(&self) -> String {
        self.to_string()
    }

    /// Parse a digest from lowercase or uppercase hex.
    pub fn from_hex(hex: &str) -> Result<Self, HashParseError> {
        if hex.len() != DIGEST_LEN * 2 {
            return Err(HashParseError::Length(hex.len()));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        for (i, byte) in bytes.iter_mut().enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            *byte = u8::from_str_radix(pair, 16).map_err(|_| HashParseError::NonHex)?;
        }
        Ok(Self(bytes))
    }
}

impl From<[u8; DIGEST_LEN]> for ContentHash {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ContentHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(D::Error::custom)
    }
}

/// Errors produced when decoding a hex digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HashParseError {
    /// The hex string does not match the declared digest width.
    #[error("digest length mismatch: expected {expected} hex chars, found {0}", expected = DIGEST_LEN * 2)]
    Length(usize),

    /// The string contains non-hex characters.
    #[error("digest contains non-hex characters")]
    NonHex,
}

// ---------------------------------------------------------------------------
// Chunk planning
// ---------------------------------------------------------------------------

/// Parameters that determine how a file was split into chunks.
///
/// Re-running the planner with these parameters over the file's byte
/// length reproduces the exact chunk boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingParams {
    /// Multiplier applied to each Fibonacci term to get a tier's chunk size.
    pub base_chunk_bytes: u64,
    /// Seed pair for the Fibonacci progression (`[1, 2]` by default).
    pub fib_start: [u64; 2],
    /// Highest tier number used by the plan (0 for empty files).
    pub max_tier: u32,
}

/// One tier's slice of the chunk plan: `count` chunks of (at most)
/// `chunk_bytes` each. The final chunk of the final tier may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierRange {
    /// Tier number in the Fibonacci progression.
    pub tier: u32,
    /// Number of chunks in this tier.
    pub count: u64,
    /// Nominal chunk size for this tier in bytes.
    pub chunk_bytes: u64,
}

/// A single planned chunk. Ephemeral: derived from
/// [`ChunkingParams`] + byte length, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Tier this chunk belongs to.
    pub tier: u32,
    /// Index within the tier.
    pub index: u32,
    /// Byte offset within the original file.
    pub offset: u64,
    /// Actual length of this chunk in bytes.
    pub length: u64,
    /// Nominal chunk size for the tier.
    pub chunk_bytes: u64,
    /// Position in the global planner ordering, used as the Merkle leaf index.
    pub leaf_index: u64,
}

// ---------------------------------------------------------------------------
// Origin manifest
// ---------------------------------------------------------------------------

/// Merkle tree summary stored in a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleSummary {
    /// Root of the tree built over per-chunk leaf hashes.
    pub root: ContentHash,
    /// Number of leaves (equals the number of planned chunks).
    pub leaf_count: u64,
}

/// Playback hint attached to manifests for media files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaHint {
    /// Container MIME type (e.g. `video/mp4`).
    pub container: String,
    /// Codec string for the segmented media buffer (e.g. `avc1.42E01E`).
    pub codecs: String,
}

/// Hash binding carried inside the manifest's proof capsule.
///
/// Restates the identity-bearing fields so a capsule extracted from the
/// manifest remains self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapsuleBinding {
    /// Whole-file content hash.
    pub file_hash: ContentHash,
    /// File length in bytes.
    pub byte_length: u64,
    /// Chunking parameters.
    pub chunking: ChunkingParams,
    /// Merkle root over chunk leaf hashes.
    pub merkle_root: ContentHash,
}

/// Content descriptor for one ingested file, keyed by `fileHash`.
///
/// Created once at ingestion and immutable thereafter: any byte change in
/// the source produces a different `fileHash` and therefore a different
/// manifest identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginManifest {
    /// Manifest format version; readers reject unknown versions.
    pub version: u8,
    /// Original file name, for display only.
    pub file_name: String,
    /// MIME type of the original file.
    pub mime: String,
    /// Total file length in bytes.
    pub byte_length: u64,
    /// Whole-file content hash (the manifest's storage identity).
    pub file_hash: ContentHash,
    /// Chunking parameters used at ingestion.
    pub chunking: ChunkingParams,
    /// Merkle summary over chunk leaf hashes.
    pub merkle: MerkleSummary,
    /// Per-tier chunk ranges; together they partition `[0, byteLength)`.
    pub lineage_index: Vec<TierRange>,
    /// Present for media files that can be streamed progressively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_hint: Option<MediaHint>,
    /// Self-describing hash binding.
    pub capsule: CapsuleBinding,
}

impl OriginManifest {
    /// Structural validation applied at the storage read boundary.
    ///
    /// Checks everything that can be verified without re-running the
    /// planner: version, tier numbering, byte coverage, leaf count, and
    /// capsule agreement. The storage layer additionally compares
    /// `lineage_index` against a re-derived plan.
    pub fn validate(&self) -> Result<(), ManifestInvalid> {
        if self.version != MANIFEST_VERSION {
            return Err(ManifestInvalid::UnsupportedVersion {
                found: self.version,
                supported: MANIFEST_VERSION,
            });
        }

        if self.capsule.file_hash != self.file_hash
            || self.capsule.byte_length != self.byte_length
            || self.capsule.merkle_root != self.merkle.root
            || self.capsule.chunking != self.chunking
        {
            return Err(ManifestInvalid::CapsuleMismatch);
        }

        // The planner asserts on zero parameters; a manifest carrying them
        // must never reach a re-derivation.
        if self.chunking.base_chunk_bytes == 0
            || self.chunking.fib_start[0] == 0
            || self.chunking.fib_start[1] == 0
        {
            return Err(ManifestInvalid::ChunkingInvalid);
        }

        if self.byte_length == 0 {
            if !self.lineage_index.is_empty() || self.merkle.leaf_count != 0 {
                return Err(ManifestInvalid::TierCoverage);
            }
            return Ok(());
        }

        let mut full_bytes: u128 = 0;
        let mut leaf_count: u64 = 0;
        for (i, range) in self.lineage_index.iter().enumerate() {
            if range.tier != i as u32 || range.count == 0 || range.chunk_bytes == 0 {
                return Err(ManifestInvalid::TierNumbering { position: i });
            }
            full_bytes += range.count as u128 * range.chunk_bytes as u128;
            // A total beyond u64 cannot partition any byte range.
            leaf_count = leaf_count
                .checked_add(range.count)
                .ok_or(ManifestInvalid::TierCoverage)?;
        }

        // All chunks are full-size except possibly the last, so the nominal
        // coverage may exceed byteLength by strictly less than one chunk.
        let last = match self.lineage_index.last() {
            Some(last) => last,
            None => return Err(ManifestInvalid::TierCoverage),
        };
        let byte_length = self.byte_length as u128;
        if full_bytes < byte_length || full_bytes - byte_length >= last.chunk_bytes as u128 {
            return Err(ManifestInvalid::TierCoverage);
        }

        if leaf_count != self.merkle.leaf_count {
            return Err(ManifestInvalid::LeafCount {
                declared: self.merkle.leaf_count,
                indexed: leaf_count,
            });
        }

        if self.chunking.max_tier != last.tier {
            return Err(ManifestInvalid::TierNumbering {
                position: self.lineage_index.len() - 1,
            });
        }

        Ok(())
    }
}

/// Reasons a manifest fails boundary validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ManifestInvalid {
    /// Manifest has an unknown format version.
    #[error("unsupported manifest version {found}, this reader supports version {supported}")]
    UnsupportedVersion {
        /// Version found in the manifest.
        found: u8,
        /// Version this reader supports.
        supported: u8,
    },

    /// Capsule binding disagrees with the manifest's own fields.
    #[error("capsule binding does not match manifest fields")]
    CapsuleMismatch,

    /// Chunking parameters contain a zero term and cannot reproduce any
    /// plan.
    #[error("chunking parameters contain a zero term")]
    ChunkingInvalid,

    /// Tier ranges are misnumbered or empty.
    #[error("lineage index tier {position} is misnumbered or empty")]
    TierNumbering {
        /// Offending position in the lineage index.
        position: usize,
    },

    /// Tier ranges do not cover `[0, byteLength)` exactly.
    #[error("lineage index does not partition the file's byte range")]
    TierCoverage,

    /// Declared leaf count disagrees with the lineage index.
    #[error("merkle leaf count {declared} does not match lineage index total {indexed}")]
    LeafCount {
        /// Leaf count declared in the merkle summary.
        declared: u64,
        /// Chunk count summed over the lineage index.
        indexed: u64,
    },
}

// ---------------------------------------------------------------------------
// Lineage key
// ---------------------------------------------------------------------------

/// Merkle proof binding one chunk to a manifest root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafProof {
    /// The chunk's position in the global planner ordering.
    pub leaf_index: u64,
    /// Ordered sibling hashes, leaf to root.
    pub proof: Vec<ContentHash>,
    /// Root the proof resolves to; equals the manifest's Merkle root.
    pub root: ContentHash,
}

/// Proof-and-location record for one physical chunk of an origin file.
///
/// One lineage key exists per planned chunk, keyed in storage by
/// `(fileHash, tier, chunkIndex)`. Like manifests, lineage keys are
/// write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageKey {
    /// Whole-file hash of the origin this chunk belongs to.
    pub origin_key_ref: ContentHash,
    /// Tier in the Fibonacci progression.
    pub tier: u32,
    /// Index within the tier.
    pub chunk_index: u32,
    /// Byte offset of the chunk within the original file.
    pub chunk_byte_offset: u64,
    /// Length of the chunk in bytes.
    pub chunk_byte_length: u64,
    /// Content hash of the chunk's bytes.
    pub chunk_hash: ContentHash,
    /// Merkle proof for this chunk's leaf.
    pub merkle: LeafProof,
    /// Where this record came from (e.g. `ingest`, `token`).
    pub provenance: String,
    /// Storage key of the chunk's payload blob (`blobs/<chunkHash>`).
    pub payload: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
