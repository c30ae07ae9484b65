use axum::{extract::State, http::StatusCode, routing::get, Router};
use prometheus::{Registry, TextEncoder};
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Serve the Prometheus exposition endpoint until the token is cancelled.
pub async fn serve(addr: SocketAddr, registry: Registry, shutdown_token: CancellationToken) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "failed to bind metrics endpoint");
            return;
        }
    };

    info!(addr = %addr, "metrics endpoint listening");

    let shutdown = async move { shutdown_token.cancelled().await };
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
    {
        error!(error = %e, "metrics endpoint error");
    }
}

async fn metrics_handler(State(registry): State<Registry>) -> Result<String, StatusCode> {
    TextEncoder::new()
        .encode_to_string(&registry.gather())
        .map_err(|e| {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::metrics::IngestMetrics;

    #[tokio::test]
    async fn test_metrics_handler_renders_registered_counters() {
        let registry = Registry::new();
        let metrics = IngestMetrics::new(&registry).unwrap();
        metrics.messages_received.inc();

        let body = metrics_handler(State(registry)).await.unwrap();
        assert!(body.contains("message_throughput_total 1"));
        assert!(body.contains("error_count 0"));
    }
}
