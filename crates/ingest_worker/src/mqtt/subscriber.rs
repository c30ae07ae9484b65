use crate::domain::SnapshotService;
use crate::ingest_worker::IngestWorkerConfig;
use anyhow::{anyhow, Context};
use common::metrics::IngestMetrics;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS, TlsConfiguration,
    Transport,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const CLIENT_ID: &str = "fieldflow-ingest";
const CHANNEL_CAPACITY: usize = 100;

/// Run the MQTT ingest session for the configured broker.
///
/// Establishes the connection with bounded retry, subscribes to the
/// configured topic, then dispatches inbound publishes one at a time until
/// cancellation or until the session drops. Returns an error only when the
/// retry bound is exhausted at startup; every other exit is a clean return
/// after an explicit disconnect.
#[instrument(
    name = "mqtt_ingest",
    skip_all,
    fields(host = %config.broker_host, port = config.broker_port, topic = %config.topic)
)]
pub async fn run_mqtt_ingest(
    config: &IngestWorkerConfig,
    service: Arc<SnapshotService>,
    metrics: IngestMetrics,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    let ca = std::fs::read(&config.ca_file).with_context(|| {
        format!(
            "failed to read CA certificate {}",
            config.ca_file.display()
        )
    })?;

    let (client, eventloop) = connect_with_retry(
        config.max_retries,
        config.retry_interval,
        &metrics,
        |attempt| dial(config, ca.clone(), attempt),
    )
    .await?;

    // The startup connack stands in for the connect callback: subscribe on
    // success, absorb and count a failure.
    match client
        .subscribe(config.topic.as_str(), QoS::AtLeastOnce)
        .await
    {
        Ok(()) => info!(topic = %config.topic, "subscribed to topic"),
        Err(e) => {
            error!(topic = %config.topic, error = %e, "failed to subscribe");
            metrics.error_count.inc();
        }
    }

    run_session(client, eventloop, service, shutdown_token).await
}

/// One connection attempt: dial the broker and wait for its connack.
async fn dial(
    config: &IngestWorkerConfig,
    ca: Vec<u8>,
    attempt: u32,
) -> anyhow::Result<(AsyncClient, EventLoop)> {
    debug!(
        attempt,
        host = %config.broker_host,
        port = config.broker_port,
        "dialing broker"
    );

    let mut options = MqttOptions::new(CLIENT_ID, config.broker_host.clone(), config.broker_port);
    options.set_credentials(config.username.clone(), config.password.clone());
    options.set_keep_alive(Duration::from_secs(30));
    options.set_clean_session(true);
    options.set_transport(Transport::Tls(TlsConfiguration::Simple {
        ca,
        alpn: None,
        client_auth: None,
    }));

    let (client, mut eventloop) = AsyncClient::new(options, CHANNEL_CAPACITY);

    match eventloop.poll().await {
        Ok(Event::Incoming(Packet::ConnAck(ack))) if ack.code == ConnectReturnCode::Success => {
            info!("connected to MQTT broker");
            Ok((client, eventloop))
        }
        Ok(Event::Incoming(Packet::ConnAck(ack))) => {
            Err(anyhow!("connection refused with code {:?}", ack.code))
        }
        Ok(event) => Err(anyhow!("unexpected event before connack: {:?}", event)),
        Err(e) => Err(anyhow!("connection attempt failed: {e}")),
    }
}

/// Bounded startup retry: up to `max_retries` attempts with a fixed sleep
/// between them. Each failed attempt increments the error counter; on
/// exhaustion the counter is incremented once more and a fatal error is
/// returned for the caller to turn into process exit.
async fn connect_with_retry<T, F, Fut>(
    max_retries: u32,
    retry_interval: Duration,
    metrics: &IngestMetrics,
    mut attempt: F,
) -> anyhow::Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut retries = 0;
    while retries < max_retries {
        match attempt(retries + 1).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                error!(
                    attempt = retries + 1,
                    max_retries,
                    error = %e,
                    "connection attempt failed"
                );
                retries += 1;
                metrics.error_count.inc();
                tokio::time::sleep(retry_interval).await;
            }
        }
    }

    error!(max_retries, "failed to connect, giving up");
    metrics.error_count.inc();
    Err(anyhow!(
        "failed to connect to broker after {max_retries} attempts"
    ))
}

/// Receive loop: dispatch publishes until cancellation or a session drop.
/// Both exits disconnect explicitly and return cleanly. A dropped session
/// does not start a fresh retry cycle; restart policy lives outside the
/// process.
async fn run_session(
    client: AsyncClient,
    mut eventloop: EventLoop,
    service: Arc<SnapshotService>,
    shutdown_token: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                info!("shutdown signal received");
                disconnect(&client).await;
                return Ok(());
            }
            event = eventloop.poll() => {
                match event {
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        service.process_message(&publish.payload).await;
                    }
                    Ok(Event::Incoming(Packet::SubAck(_))) => {
                        debug!("subscription acknowledged");
                    }
                    Ok(Event::Incoming(Packet::PingResp)) => {
                        // Connection is healthy.
                    }
                    Ok(_) => {
                        // Outgoing packets and other acks.
                    }
                    Err(e) => {
                        warn!(error = %e, "MQTT session dropped");
                        info!("shutting down gracefully");
                        disconnect(&client).await;
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Idempotent, best-effort disconnect; safe to call with work in flight.
async fn disconnect(client: &AsyncClient) {
    if let Err(e) = client.disconnect().await {
        debug!(error = %e, "disconnect request failed");
    }
    info!("disconnected from MQTT broker");
}
