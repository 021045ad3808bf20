//! Error types for content addressing operations.

/// Errors that can occur during CAS operations.
#[derive(Debug, thiserror::Error)]
pub enum CasError {
    /// An I/O error occurred while streaming bytes into the hasher.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
