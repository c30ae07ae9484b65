pub mod domain;
pub mod metrics;
pub mod telemetry;

pub use domain::*;
pub use metrics::IngestMetrics;
pub use telemetry::{init_telemetry, TelemetryConfig};

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use domain::MockDocumentSink;
