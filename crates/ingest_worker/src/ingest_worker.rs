use crate::domain::SnapshotService;
use crate::mqtt;
use common::domain::DocumentSink;
use common::metrics::IngestMetrics;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Immutable connection configuration, created once at startup and owned by
/// the worker for its lifetime.
#[derive(Clone)]
pub struct IngestWorkerConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub ca_file: PathBuf,
    pub username: String,
    pub password: String,
    pub topic: String,
    pub max_retries: u32,
    pub retry_interval: Duration,
}

/// Owns the broker session end to end: bounded-retry connect, subscribe,
/// message dispatch, and cancellation-driven shutdown.
pub struct IngestWorker {
    config: IngestWorkerConfig,
    service: Arc<SnapshotService>,
    metrics: IngestMetrics,
}

impl IngestWorker {
    pub fn new(
        config: IngestWorkerConfig,
        sink: Arc<dyn DocumentSink>,
        metrics: IngestMetrics,
    ) -> Self {
        let service = Arc::new(SnapshotService::new(sink, metrics.clone()));
        Self {
            config,
            service,
            metrics,
        }
    }

    /// Drive the connection lifecycle. Blocks the calling task until the
    /// token is cancelled, the session drops, or the startup retry bound is
    /// exhausted (the only error exit).
    pub async fn run(self, shutdown_token: CancellationToken) -> anyhow::Result<()> {
        info!(
            host = %self.config.broker_host,
            port = self.config.broker_port,
            topic = %self.config.topic,
            "starting MQTT ingest worker"
        );

        mqtt::run_mqtt_ingest(&self.config, self.service, self.metrics, shutdown_token).await
    }
}
