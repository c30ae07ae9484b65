use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // Broker configuration
    /// MQTT broker host
    #[serde(default = "default_broker_host")]
    pub broker_host: String,

    /// MQTT broker port (TLS)
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,

    /// Path to the CA certificate used to validate the broker
    #[serde(default = "default_ca_file")]
    pub ca_file: String,

    /// Broker username
    #[serde(default)]
    pub username: String,

    /// Broker password
    #[serde(default)]
    pub password: String,

    /// Topic to subscribe to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Maximum startup connection attempts before fatal exit
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds between startup connection attempts
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    // Observability
    /// Bind address for the Prometheus /metrics endpoint
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,

    /// Service name used in log context
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    8883
}

fn default_ca_file() -> String {
    "ca.crt".to_string()
}

fn default_topic() -> String {
    "fleet/snapshots".to_string()
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_interval_secs() -> u64 {
    10
}

fn default_metrics_addr() -> String {
    "0.0.0.0:9090".to_string()
}

fn default_service_name() -> String {
    "fieldflow-ingest".to_string()
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("FIELDFLOW"))
            .build()?
            .try_deserialize()
    }
}
