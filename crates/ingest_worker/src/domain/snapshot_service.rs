use common::domain::DocumentSink;
use common::metrics::IngestMetrics;
use fieldflow_payload::transform_snapshot;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, instrument, warn};

/// Domain service for one inbound snapshot message
///
/// Flow:
/// 1. Transform the raw bytes into a normalized document
/// 2. Observe processing time and count the message
/// 3. Deliver the document to the configured sink
///
/// Every failure is absorbed here — logged and counted in `error_count`,
/// never propagated. A single bad message must not terminate the session.
pub struct SnapshotService {
    sink: Arc<dyn DocumentSink>,
    metrics: IngestMetrics,
}

impl SnapshotService {
    pub fn new(sink: Arc<dyn DocumentSink>, metrics: IngestMetrics) -> Self {
        Self { sink, metrics }
    }

    /// Process a single raw message received from the broker.
    #[instrument(skip_all, fields(payload_size = payload.len()))]
    pub async fn process_message(&self, payload: &[u8]) {
        let start = Instant::now();
        let outcome = transform_snapshot(payload);

        self.metrics
            .processing_time
            .observe(start.elapsed().as_secs_f64());
        self.metrics.messages_received.inc();

        match outcome {
            Ok(document) => {
                debug!(
                    time = %document.time,
                    devices = document.data.len(),
                    "snapshot normalized"
                );
                if let Err(e) = self.sink.deliver(&document).await {
                    error!(error = %e, "failed to deliver normalized document");
                    self.metrics.error_count.inc();
                }
            }
            Err(e) => {
                warn!(error = %e, "dropping malformed snapshot");
                self.metrics.error_count.inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DomainError, MockDocumentSink, NormalizedDocument};
    use prometheus::Registry;
    use serde_json::json;

    fn test_metrics() -> IngestMetrics {
        IngestMetrics::new(&Registry::new()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_message_is_delivered_and_counted() {
        let mut sink = MockDocumentSink::new();
        sink.expect_deliver()
            .withf(|document: &NormalizedDocument| {
                document.time == "2023-08-25T16:02:10+00:00"
                    && serde_json::to_value(&document.data["s1"]).unwrap()
                        == json!({"x": 1, "y": 2})
            })
            .times(1)
            .returning(|_| Ok(()));

        let metrics = test_metrics();
        let service = SnapshotService::new(Arc::new(sink), metrics.clone());

        let payload =
            serde_json::to_vec(&json!({"t": 1692979330, "r": [{"_vid": "s1", "x": 1}, {"_vid": "s1", "y": 2}]}))
                .unwrap();
        service.process_message(&payload).await;

        assert_eq!(metrics.messages_received.get(), 1);
        assert_eq!(metrics.error_count.get(), 0);
        assert_eq!(metrics.processing_time.get_sample_count(), 1);
    }

    #[tokio::test]
    async fn test_malformed_message_is_counted_not_delivered() {
        let mut sink = MockDocumentSink::new();
        sink.expect_deliver().times(0);

        let metrics = test_metrics();
        let service = SnapshotService::new(Arc::new(sink), metrics.clone());

        service.process_message(b"{not json").await;

        assert_eq!(metrics.messages_received.get(), 1);
        assert_eq!(metrics.error_count.get(), 1);
    }

    #[tokio::test]
    async fn test_message_missing_timestamp_is_counted_as_error() {
        let mut sink = MockDocumentSink::new();
        sink.expect_deliver().times(0);

        let metrics = test_metrics();
        let service = SnapshotService::new(Arc::new(sink), metrics.clone());

        let payload = serde_json::to_vec(&json!({"r": []})).unwrap();
        service.process_message(&payload).await;

        assert_eq!(metrics.error_count.get(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_is_absorbed_and_counted() {
        let mut sink = MockDocumentSink::new();
        sink.expect_deliver()
            .times(1)
            .returning(|_| Err(DomainError::DeliveryFailed("downstream closed".to_string())));

        let metrics = test_metrics();
        let service = SnapshotService::new(Arc::new(sink), metrics.clone());

        let payload = serde_json::to_vec(&json!({"t": 1692979330, "r": []})).unwrap();
        service.process_message(&payload).await;

        assert_eq!(metrics.messages_received.get(), 1);
        assert_eq!(metrics.error_count.get(), 1);
    }

    #[tokio::test]
    async fn test_consecutive_messages_are_independent() {
        let mut sink = MockDocumentSink::new();
        sink.expect_deliver().times(1).returning(|_| Ok(()));

        let metrics = test_metrics();
        let service = SnapshotService::new(Arc::new(sink), metrics.clone());

        service.process_message(b"garbage").await;
        let payload = serde_json::to_vec(&json!({"t": 1692979330, "r": []})).unwrap();
        service.process_message(&payload).await;

        assert_eq!(metrics.messages_received.get(), 2);
        assert_eq!(metrics.error_count.get(), 1);
    }
}
