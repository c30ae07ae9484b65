use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};

/// Process-wide ingest counters, registered on an injected registry so tests
/// can use a fresh one and assert exact values.
#[derive(Clone)]
pub struct IngestMetrics {
    /// Errors of any kind: failed connection attempts, non-success connect
    /// acks, malformed payloads, failed deliveries.
    pub error_count: IntCounter,
    /// Messages received from the broker, whether or not they transformed.
    pub messages_received: IntCounter,
    /// Seconds spent transforming one message.
    pub processing_time: Histogram,
}

impl IngestMetrics {
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let error_count = IntCounter::with_opts(Opts::new("error_count", "Number of errors"))?;
        let messages_received = IntCounter::with_opts(Opts::new(
            "message_throughput_total",
            "Total number of received messages",
        ))?;
        let processing_time = Histogram::with_opts(HistogramOpts::new(
            "message_processing_time",
            "Time spent processing messages",
        ))?;

        registry.register(Box::new(error_count.clone()))?;
        registry.register(Box::new(messages_received.clone()))?;
        registry.register(Box::new(processing_time.clone()))?;

        Ok(Self {
            error_count,
            messages_received,
            processing_time,
        })
    }
}
