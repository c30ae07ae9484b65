mod config;
mod metrics_server;

use crate::config::ServiceConfig;
use common::metrics::IngestMetrics;
use common::telemetry::{init_telemetry, TelemetryConfig};
use ingest_worker::{IngestWorker, IngestWorkerConfig, LogDocumentSink};
use prometheus::Registry;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_telemetry(&TelemetryConfig {
        service_name: config.service_name.clone(),
        log_level: config.log_level.clone(),
    }) {
        eprintln!("Failed to initialize telemetry: {}", e);
        std::process::exit(1);
    }

    info!(
        broker_host = %config.broker_host,
        broker_port = config.broker_port,
        topic = %config.topic,
        "Starting fieldflow-ingest service"
    );

    let registry = Registry::new();
    let metrics = match IngestMetrics::new(&registry) {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("Failed to register metrics: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_addr: SocketAddr = match config.metrics_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(addr = %config.metrics_addr, "Invalid metrics address: {}", e);
            std::process::exit(1);
        }
    };

    // Shutdown token - cancelled by SIGINT/SIGTERM, observed by every task
    let shutdown_token = CancellationToken::new();
    spawn_signal_handlers(shutdown_token.clone());

    tokio::spawn(metrics_server::serve(
        metrics_addr,
        registry.clone(),
        shutdown_token.clone(),
    ));

    let worker = IngestWorker::new(
        IngestWorkerConfig {
            broker_host: config.broker_host.clone(),
            broker_port: config.broker_port,
            ca_file: PathBuf::from(&config.ca_file),
            username: config.username.clone(),
            password: config.password.clone(),
            topic: config.topic.clone(),
            max_retries: config.max_retries,
            retry_interval: Duration::from_secs(config.retry_interval_secs),
        },
        Arc::new(LogDocumentSink),
        metrics,
    );

    match worker.run(shutdown_token.clone()).await {
        Ok(()) => {
            shutdown_token.cancel();
            info!("Shutdown complete");
        }
        Err(e) => {
            error!("Ingest worker failed: {:#}", e);
            shutdown_token.cancel();
            std::process::exit(1);
        }
    }
}

/// Register interrupt handlers that cancel the shared token. Cancellation is
/// the only shutdown mechanism; the worker disconnects explicitly before
/// returning.
fn spawn_signal_handlers(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(err) => {
                error!("Failed to set up SIGTERM handler: {}", err);
                return;
            }
        };
        sigterm.recv().await;
        info!("Received SIGTERM signal");
        token.cancel();
    });

    #[cfg(not(unix))]
    drop(token);
}
