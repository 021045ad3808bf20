//! End-to-end lineage reconciliation: storage plus share-link tokens.

use strata_lineage::{LineageCapsule, LocationTokens, collect_lineage, encode_token};
use strata_types::ContentHash;

use crate::cancel::CancelToken;
use crate::media::BufferSink;
use crate::tests::helpers::{ingest_bytes, memory_engine, test_data};

#[tokio::test]
async fn test_reconstruct_from_token_carried_lineage() {
    let (engine, _) = memory_engine();
    let data = test_data(800);
    let (receipt, manifest) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    // Ship the full lineage through a share link instead of reading it
    // back from storage; blobs still come from the storage layer.
    let entries = engine
        .load_lineage(&receipt.origin_sig)
        .await
        .into_entries();
    let token = encode_token(&LineageCapsule::new(receipt.origin_sig, entries));
    let location = LocationTokens::new(format!("https://example.com/view?lineage={token}"));

    let lineage = collect_lineage(&receipt.origin_sig, &[&location]);
    assert_eq!(lineage.len() as u64, manifest.merkle.leaf_count);

    let mut sink = BufferSink::new();
    engine
        .reconstruct(&manifest, &lineage, &mut sink, &CancelToken::new())
        .await
        .unwrap();
    assert_eq!(sink.data(), &data[..]);
}

#[tokio::test]
async fn test_foreign_capsules_contribute_nothing() {
    let (engine, _) = memory_engine();
    let data = test_data(500);
    let (receipt, _) = ingest_bytes(&engine, "a.bin", "application/octet-stream", &data).await;

    let entries = engine
        .load_lineage(&receipt.origin_sig)
        .await
        .into_entries();
    let token = encode_token(&LineageCapsule::new(
        ContentHash::from_data(b"someone else's file"),
        entries,
    ));
    let location = LocationTokens::new(format!("https://example.com/view?lineage={token}"));

    assert!(collect_lineage(&receipt.origin_sig, &[&location]).is_empty());
}
