//! End-to-end pipeline tests: raw broker bytes through the snapshot service
//! into a mocked sink, with counter assertions on a fresh registry.

use common::domain::{MockDocumentSink, NormalizedDocument};
use common::metrics::IngestMetrics;
use ingest_worker::domain::SnapshotService;
use prometheus::Registry;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn test_snapshot_flows_from_bytes_to_sink() {
    let mut sink = MockDocumentSink::new();
    sink.expect_deliver()
        .withf(|document: &NormalizedDocument| {
            serde_json::to_value(document).unwrap()
                == json!({
                    "time": "2023-08-25T16:02:10+00:00",
                    "data": {"s1": {"x": 1, "y": 2}}
                })
        })
        .times(1)
        .returning(|_| Ok(()));

    let metrics = IngestMetrics::new(&Registry::new()).unwrap();
    let service = SnapshotService::new(Arc::new(sink), metrics.clone());

    let payload = br#"{"t":1692979330,"r":[{"_vid":"s1","x":1},{"_vid":"s1","y":2}]}"#;
    service.process_message(payload).await;

    assert_eq!(metrics.messages_received.get(), 1);
    assert_eq!(metrics.error_count.get(), 0);
}

#[tokio::test]
async fn test_all_null_reading_yields_empty_document() {
    let mut sink = MockDocumentSink::new();
    sink.expect_deliver()
        .withf(|document: &NormalizedDocument| {
            document.time == "2023-08-25T16:02:10+00:00" && document.data.is_empty()
        })
        .times(1)
        .returning(|_| Ok(()));

    let metrics = IngestMetrics::new(&Registry::new()).unwrap();
    let service = SnapshotService::new(Arc::new(sink), metrics.clone());

    let payload = br#"{"t":1692979330,"r":[{"_vid":"s1","x":null}]}"#;
    service.process_message(payload).await;

    assert_eq!(metrics.error_count.get(), 0);
}

#[tokio::test]
async fn test_mixed_batch_counts_errors_per_message() {
    let mut sink = MockDocumentSink::new();
    sink.expect_deliver().times(2).returning(|_| Ok(()));

    let metrics = IngestMetrics::new(&Registry::new()).unwrap();
    let service = SnapshotService::new(Arc::new(sink), metrics.clone());

    service
        .process_message(br#"{"t":1692979330,"r":[{"_vid":"s1","x":1}]}"#)
        .await;
    service.process_message(br#"{"r":[]}"#).await;
    service.process_message(b"not json at all").await;
    service
        .process_message(br#"{"t":1692979330,"r":[]}"#)
        .await;

    assert_eq!(metrics.messages_received.get(), 4);
    assert_eq!(metrics.error_count.get(), 2);
    assert_eq!(metrics.processing_time.get_sample_count(), 4);
}
