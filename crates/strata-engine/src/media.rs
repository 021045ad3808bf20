//! Media sinks for reconstruction output.
//!
//! A [`MediaSink`] receives reconstructed bytes. Progressive playback
//! front-ends implement this over a buffered media pipeline; the engine
//! only relies on the contract here: `open` before any `append`, every
//! `append` awaited to completion before the next is issued, `close` at
//! the end.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

/// Errors reported by media sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink cannot play this MIME type.
    #[error("sink does not support {0:?}")]
    Unsupported(String),

    /// An append was issued before the previous one completed.
    #[error("append issued while another append is in flight")]
    ConcurrentAppend,

    /// The sink was written to before `open` or after `close`.
    #[error("sink is not open")]
    NotOpen,
}

/// Destination for reconstructed bytes.
#[async_trait]
pub trait MediaSink: Send {
    /// Whether this sink can consume the given MIME type progressively.
    fn supports(&self, mime: &str) -> bool;

    /// Prepare the sink for the given MIME type.
    async fn open(&mut self, mime: &str) -> Result<(), SinkError>;

    /// Append one segment. The engine awaits each append before issuing
    /// the next, so implementations never see overlapping appends.
    async fn append(&mut self, bytes: Bytes) -> Result<(), SinkError>;

    /// Signal that no further bytes will arrive.
    async fn close(&mut self) -> Result<(), SinkError>;
}

/// In-memory sink that records every append.
///
/// Accepts any MIME type unless restricted with [`BufferSink::accepting`].
/// Detects overlapping appends, which would indicate the caller failed to
/// await a previous append to completion.
#[derive(Debug, Default)]
pub struct BufferSink {
    accepted: Option<Vec<String>>,
    open: bool,
    closed: bool,
    in_flight: AtomicBool,
    data: Vec<u8>,
    append_sizes: Vec<usize>,
}

impl BufferSink {
    /// A sink that supports every MIME type.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that supports only the listed MIME types.
    pub fn accepting(mimes: &[&str]) -> Self {
        Self {
            accepted: Some(mimes.iter().map(|m| m.to_string()).collect()),
            ..Self::default()
        }
    }

    /// All bytes appended so far, in arrival order.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Length of each append, in arrival order.
    pub fn append_sizes(&self) -> &[usize] {
        &self.append_sizes
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl MediaSink for BufferSink {
    fn supports(&self, mime: &str) -> bool {
        match &self.accepted {
            Some(list) => list.iter().any(|m| m == mime),
            None => true,
        }
    }

    async fn open(&mut self, mime: &str) -> Result<(), SinkError> {
        if !self.supports(mime) {
            return Err(SinkError::Unsupported(mime.to_string()));
        }
        self.open = true;
        self.closed = false;
        Ok(())
    }

    async fn append(&mut self, bytes: Bytes) -> Result<(), SinkError> {
        if !self.open || self.closed {
            return Err(SinkError::NotOpen);
        }
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(SinkError::ConcurrentAppend);
        }
        // Yield so an overlapping append would be observable.
        tokio::task::yield_now().await;
        self.append_sizes.push(bytes.len());
        self.data.extend_from_slice(&bytes);
        self.in_flight.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if !self.open {
            return Err(SinkError::NotOpen);
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffer_sink_records_appends() {
        let mut sink = BufferSink::new();
        sink.open("video/mp4").await.unwrap();
        sink.append(Bytes::from_static(b"abc")).await.unwrap();
        sink.append(Bytes::from_static(b"de")).await.unwrap();
        sink.close().await.unwrap();
        assert_eq!(sink.data(), b"abcde");
        assert_eq!(sink.append_sizes(), &[3, 2]);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn test_buffer_sink_rejects_unopened_append() {
        let mut sink = BufferSink::new();
        assert!(matches!(
            sink.append(Bytes::from_static(b"x")).await,
            Err(SinkError::NotOpen)
        ));
    }

    #[tokio::test]
    async fn test_accepting_list_restricts_mime() {
        let mut sink = BufferSink::accepting(&["video/mp4"]);
        assert!(sink.supports("video/mp4"));
        assert!(!sink.supports("video/webm"));
        assert!(matches!(
            sink.open("video/webm").await,
            Err(SinkError::Unsupported(_))
        ));
    }
}
