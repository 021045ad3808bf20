//! Pluggable content hashing.
//!
//! Callers depend on [`ContentHasher`] rather than a concrete algorithm;
//! swapping BLAKE3 for SHA-256 (or anything else with a 32-byte digest)
//! never touches call sites. [`hash_stream`] hashes a reader in bounded
//! slices and is guaranteed to equal hashing the full concatenation,
//! whatever slice size is used.

use strata_types::ContentHash;
use tokio::io::AsyncRead;

use crate::error::CasError;

/// Incremental digest state produced by [`ContentHasher::begin`].
pub trait HashState: Send {
    /// Absorb more bytes.
    fn update(&mut self, data: &[u8]);

    /// Consume the state and produce the digest.
    fn finalize(self: Box<Self>) -> ContentHash;
}

/// A fixed-width hash over byte buffers, strings, and streamed blobs.
///
/// Implementations must be pure: the same input always yields the same
/// digest, and the digest width is fixed at [`strata_types::DIGEST_LEN`]
/// by construction.
pub trait ContentHasher: Send + Sync {
    /// Short algorithm name (e.g. `"blake3"`).
    fn algorithm(&self) -> &'static str;

    /// Start an incremental hash.
    fn begin(&self) -> Box<dyn HashState>;

    /// Hash a byte buffer.
    fn hash(&self, data: &[u8]) -> ContentHash {
        let mut state = self.begin();
        state.update(data);
        state.finalize()
    }

    /// Hash a string's UTF-8 bytes.
    fn hash_utf8(&self, text: &str) -> ContentHash {
        self.hash(text.as_bytes())
    }
}

/// Hash an async reader by absorbing it in `slice_bytes`-sized slices.
///
/// Equivalent to hashing the fully concatenated stream; the slice size
/// only bounds memory. An unreadable slice aborts the hash with an error.
///
/// # Panics
///
/// Panics if `slice_bytes` is zero.
pub async fn hash_stream(
    hasher: &dyn ContentHasher,
    mut reader: impl AsyncRead + Unpin,
    slice_bytes: usize,
) -> Result<ContentHash, CasError> {
    use tokio::io::AsyncReadExt;

    assert!(slice_bytes > 0, "slice_bytes must be non-zero");

    let mut state = hasher.begin();
    let mut buf = vec![0u8; slice_bytes];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        state.update(&buf[..n]);
    }
    Ok(state.finalize())
}

// ---------------------------------------------------------------------------
// BLAKE3 (default)
// ---------------------------------------------------------------------------

/// The default content hasher: BLAKE3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

struct Blake3State(blake3::Hasher);

impl HashState for Blake3State {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> ContentHash {
        ContentHash::from(*self.0.finalize().as_bytes())
    }
}

impl ContentHasher for Blake3Hasher {
    fn algorithm(&self) -> &'static str {
        "blake3"
    }

    fn begin(&self) -> Box<dyn HashState> {
        Box::new(Blake3State(blake3::Hasher::new()))
    }
}

// ---------------------------------------------------------------------------
// SHA-256 (alternative)
// ---------------------------------------------------------------------------

/// SHA-256 hasher, interchangeable with [`Blake3Hasher`] at every call site.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

struct Sha256State(sha2::Sha256);

impl HashState for Sha256State {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> ContentHash {
        use sha2::Digest;
        let digest: [u8; 32] = self.0.finalize().into();
        ContentHash::from(digest)
    }
}

impl ContentHasher for Sha256Hasher {
    fn algorithm(&self) -> &'static str {
        "sha256"
    }

    fn begin(&self) -> Box<dyn HashState> {
        Box::new(Sha256State(<sha2::Sha256 as sha2::Digest>::new()))
    }
}
