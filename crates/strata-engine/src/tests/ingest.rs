//! Ingestion pipeline tests.

use std::sync::Arc;

use strata_cas::Blake3Hasher;
use strata_store::{KvStore, StorageLayer, origin_key};
use strata_types::ContentHash;

use crate::engine::{EngineConfig, StrataEngine};
use crate::source::MemorySource;
use crate::tests::helpers::{ingest_bytes, memory_engine, test_data};

#[tokio::test]
async fn test_receipt_identifies_the_origin() {
    let (engine, _) = memory_engine();
    let data = test_data(500);
    let (receipt, manifest) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    assert_eq!(receipt.origin_sig, ContentHash::from_data(&data));
    assert_eq!(receipt.origin_url, origin_key(&receipt.origin_sig));
    assert_eq!(manifest.file_hash, receipt.origin_sig);
    assert_eq!(manifest.byte_length, 500);
    assert_eq!(manifest.file_name, "a.bin");
}

#[tokio::test]
async fn test_every_chunk_gets_a_lineage_record_and_blob() {
    let (engine, _) = memory_engine();
    let data = test_data(1000);
    let (receipt, manifest) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    let lineage = engine.load_lineage(&receipt.origin_sig).await;
    assert_eq!(lineage.len() as u64, manifest.merkle.leaf_count);

    for entry in lineage.entries() {
        assert_eq!(entry.origin_key_ref, receipt.origin_sig);
        assert_eq!(entry.provenance, "ingest");
        assert_eq!(entry.merkle.root, manifest.merkle.root);
        assert!(engine.storage().has_blob(&entry.chunk_hash).await);

        // Stored bytes are the planned slice of the original file.
        let record = engine.storage().get_blob(&entry.chunk_hash).await.unwrap();
        let start = entry.chunk_byte_offset as usize;
        let end = start + entry.chunk_byte_length as usize;
        assert_eq!(record.bytes, &data[start..end]);
    }
}

#[tokio::test]
async fn test_ingest_is_idempotent() {
    let (engine, kv) = memory_engine();
    let data = test_data(700);
    let (receipt, _) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    let manifest_bytes = kv.get(&receipt.origin_url).await.unwrap().unwrap();
    let lineage = engine.load_lineage(&receipt.origin_sig).await;

    let (receipt_again, _) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;
    assert_eq!(receipt_again, receipt);
    assert_eq!(
        kv.get(&receipt.origin_url).await.unwrap().unwrap(),
        manifest_bytes
    );
    assert_eq!(engine.load_lineage(&receipt.origin_sig).await, lineage);
}

#[tokio::test]
async fn test_identical_chunks_share_one_blob() {
    let (engine, kv) = memory_engine();
    // 256 zero bytes with base 64: tier 0 holds two 64-byte chunks, tier 1
    // one 128-byte chunk. Three chunks, two distinct contents.
    let data = vec![0u8; 256];
    ingest_bytes(&engine, "zeros.bin", "application/octet-stream", &data).await;

    let blobs = kv.list_prefix("blobs/").await.unwrap();
    assert_eq!(blobs.len(), 2);
}

#[tokio::test]
async fn test_detached_storage_skips_ingestion() {
    let engine = StrataEngine::new(
        EngineConfig::default(),
        StorageLayer::detached(),
        Arc::new(Blake3Hasher),
    );
    let source = MemorySource::new("a.bin", "application/octet-stream", test_data(100));
    assert!(engine.ingest(&source).await.unwrap().is_none());
}

#[tokio::test]
async fn test_media_hint_only_for_streamable_types() {
    let (engine, _) = memory_engine();

    let (_, video) = ingest_bytes(&engine, "clip.mp4", "video/mp4", &test_data(300)).await;
    let hint = video.media_hint.unwrap();
    assert_eq!(hint.container, "video/mp4");
    assert!(hint.codecs.contains("avc1"));

    // Less common video containers still get a hint, without a codec
    // preset.
    let (_, ogg) = ingest_bytes(&engine, "clip.ogv", "video/ogg", &test_data(301)).await;
    let hint = ogg.media_hint.unwrap();
    assert_eq!(hint.container, "video/ogg");
    assert!(hint.codecs.is_empty());

    let (_, blob) = ingest_bytes(&engine, "doc.pdf", "application/pdf", &test_data(302)).await;
    assert!(blob.media_hint.is_none());
}

#[tokio::test]
async fn test_file_hash_and_merkle_root_are_distinct_identities() {
    let (engine, _) = memory_engine();
    let (_, manifest) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &test_data(400)).await;
    assert_ne!(manifest.file_hash, manifest.merkle.root);
}

#[tokio::test]
async fn test_empty_file_ingests_cleanly() {
    let (engine, _) = memory_engine();
    let (receipt, manifest) = ingest_bytes(&engine, "empty.bin", "application/octet-stream", &[]).await;

    assert_eq!(manifest.byte_length, 0);
    assert_eq!(manifest.merkle.leaf_count, 0);
    assert!(manifest.lineage_index.is_empty());
    assert!(engine.load_lineage(&receipt.origin_sig).await.is_empty());
}

#[tokio::test]
async fn test_verify_consistency() {
    let (engine, _) = memory_engine();
    let data = test_data(900);
    let source = MemorySource::new("a.bin", "application/octet-stream", data.clone());
    let (_, manifest) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    assert!(engine.verify_consistency(&source, &manifest).await.unwrap());

    // A root swap passes the file hash check but fails the tree rebuild.
    let mut forged = manifest.clone();
    forged.merkle.root = ContentHash::from_data(b"not the root");
    assert!(!engine.verify_consistency(&source, &forged).await.unwrap());

    // Different bytes fail immediately on the file hash.
    let other = MemorySource::new("b.bin", "application/octet-stream", test_data(900 + 1));
    assert!(!engine.verify_consistency(&other, &manifest).await.unwrap());
}
