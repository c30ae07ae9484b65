mod subscriber;

pub use subscriber::run_mqtt_ingest;
