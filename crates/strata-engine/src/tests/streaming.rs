//! Progressive streaming reconstruction tests.

use std::sync::Arc;

use strata_cas::plan_chunks;
use strata_lineage::LineageSet;
use strata_store::{MemoryKv, SlowKv};

use crate::cancel::CancelToken;
use crate::error::EngineError;
use crate::media::BufferSink;
use crate::reconstruct::ReconstructOutcome;
use crate::tests::helpers::{TEST_BASE_CHUNK, engine_over, ingest_bytes, memory_engine, test_data};

#[tokio::test]
async fn test_streaming_appends_every_chunk_in_planner_order() {
    let (engine, _) = memory_engine();
    let data = test_data(1400);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;
    let lineage = engine.load_lineage(&receipt.origin_sig).await;

    let mut sink = BufferSink::new();
    let outcome = engine
        .reconstruct(&manifest, &lineage, &mut sink, &CancelToken::new())
        .await
        .unwrap();

    let layout = plan_chunks(1400, TEST_BASE_CHUNK, manifest.chunking.fib_start);
    assert_eq!(
        outcome,
        ReconstructOutcome::Streamed {
            appended: layout.plan.len(),
            skipped: 0,
        }
    );
    // One append per chunk, sized and ordered exactly like the plan.
    let expected: Vec<usize> = layout.plan.iter().map(|c| c.length as usize).collect();
    assert_eq!(sink.append_sizes(), &expected[..]);
    assert_eq!(sink.data(), &data[..]);
    assert!(sink.is_closed());
}

#[tokio::test]
async fn test_streaming_skips_missing_chunks() {
    let (engine, _) = memory_engine();
    let data = test_data(1000);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;

    let full = engine.load_lineage(&receipt.origin_sig).await;
    let partial = LineageSet::from_entries(
        full.entries()
            .filter(|e| !(e.tier == 0 && e.chunk_index == 0))
            .cloned(),
    );

    let mut sink = BufferSink::new();
    let outcome = engine
        .reconstruct(&manifest, &partial, &mut sink, &CancelToken::new())
        .await
        .unwrap();

    let layout = plan_chunks(1000, TEST_BASE_CHUNK, manifest.chunking.fib_start);
    assert_eq!(
        outcome,
        ReconstructOutcome::Streamed {
            appended: layout.plan.len() - 1,
            skipped: 1,
        }
    );
    // Output is the original minus the withheld head chunk.
    assert_eq!(sink.data(), &data[layout.plan[0].length as usize..]);
}

#[tokio::test]
async fn test_append_order_ignores_lineage_arrival_order() {
    let (engine, _) = memory_engine();
    let data = test_data(1100);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;

    // Feed entries in reverse; the set orders by key and the planner
    // drives append order, so arrival order must not matter.
    let mut entries = engine
        .load_lineage(&receipt.origin_sig)
        .await
        .into_entries();
    entries.reverse();
    let lineage = LineageSet::from_entries(entries);

    let mut sink = BufferSink::new();
    engine
        .reconstruct(&manifest, &lineage, &mut sink, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(sink.data(), &data[..]);
}

#[tokio::test]
async fn test_streaming_over_uneven_read_latency() {
    let kv = Arc::new(MemoryKv::new());
    let slow = Arc::new(SlowKv::new(kv).read_latency(0, 3).seed(42));
    let engine = engine_over(slow);

    let data = test_data(900);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;
    let lineage = engine.load_lineage(&receipt.origin_sig).await;

    // BufferSink errors on overlapping appends, so success here means
    // each append was awaited to completion despite uneven blob reads.
    let mut sink = BufferSink::new();
    engine
        .reconstruct(&manifest, &lineage, &mut sink, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(sink.data(), &data[..]);
}

/// Takes whole-file deliveries but cannot consume anything progressively.
struct BlobOnlySink(BufferSink);

#[async_trait::async_trait]
impl crate::media::MediaSink for BlobOnlySink {
    fn supports(&self, _mime: &str) -> bool {
        false
    }

    async fn open(&mut self, mime: &str) -> Result<(), crate::media::SinkError> {
        self.0.open(mime).await
    }

    async fn append(&mut self, bytes: bytes::Bytes) -> Result<(), crate::media::SinkError> {
        self.0.append(bytes).await
    }

    async fn close(&mut self) -> Result<(), crate::media::SinkError> {
        self.0.close().await
    }
}

#[tokio::test]
async fn test_unsupporting_sink_falls_back_to_blob() {
    let (engine, _) = memory_engine();
    let data = test_data(500);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;
    let lineage = engine.load_lineage(&receipt.origin_sig).await;

    let mut sink = BlobOnlySink(BufferSink::new());
    let outcome = engine
        .reconstruct(&manifest, &lineage, &mut sink, &CancelToken::new())
        .await
        .unwrap();
    assert!(matches!(outcome, ReconstructOutcome::Blob { byte_length: 500 }));
    assert_eq!(sink.0.data(), &data[..]);
}

#[tokio::test]
async fn test_streaming_stops_on_cancellation() {
    let (engine, _) = memory_engine();
    let data = test_data(700);
    let (receipt, manifest) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &data).await;
    let lineage = engine.load_lineage(&receipt.origin_sig).await;

    let cancel = CancelToken::new();
    cancel.cancel();
    let mut sink = BufferSink::new();
    let err = engine
        .reconstruct(&manifest, &lineage, &mut sink, &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
    assert!(sink.data().is_empty());
    assert!(sink.is_closed());
}
