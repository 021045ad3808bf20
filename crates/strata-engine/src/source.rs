//! Byte sources for ingestion.
//!
//! A [`ByteSource`] exposes random access to the file being ingested.
//! The engine reads it twice: once chunk by chunk for the lineage index,
//! and once in fixed slices for the whole-file hash. Sources must return
//! identical bytes for identical ranges across reads.

use async_trait::async_trait;
use bytes::Bytes;

/// Random-access view of a file under ingestion.
#[async_trait]
pub trait ByteSource: Send + Sync {
    /// Original file name, used for the manifest only.
    fn file_name(&self) -> &str;

    /// MIME type of the content.
    fn mime(&self) -> &str;

    /// Total length in bytes.
    fn byte_length(&self) -> u64;

    /// Read exactly `length` bytes starting at `offset`.
    async fn slice(&self, offset: u64, length: u64) -> std::io::Result<Bytes>;
}

/// In-memory source backed by a [`Bytes`] buffer.
#[derive(Debug, Clone)]
pub struct MemorySource {
    file_name: String,
    mime: String,
    data: Bytes,
}

impl MemorySource {
    pub fn new(file_name: impl Into<String>, mime: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: mime.into(),
            data: data.into(),
        }
    }

    /// The backing buffer.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

#[async_trait]
impl ByteSource for MemorySource {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn mime(&self) -> &str {
        &self.mime
    }

    fn byte_length(&self) -> u64 {
        self.data.len() as u64
    }

    async fn slice(&self, offset: u64, length: u64) -> std::io::Result<Bytes> {
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= self.data.len() as u64)
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!("slice {offset}+{length} out of range"),
                )
            })?;
        Ok(self.data.slice(offset as usize..end as usize))
    }
}
