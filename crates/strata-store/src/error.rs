//! Error types for storage operations.

/// Errors that can occur inside a [`KvStore`](crate::KvStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Fjall database error.
    #[error("fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob envelope serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] postcard::Error),

    /// JSON record serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
