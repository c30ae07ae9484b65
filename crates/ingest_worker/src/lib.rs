pub mod domain;
pub mod ingest_worker;
pub mod mqtt;
pub mod sink;

pub use ingest_worker::{IngestWorker, IngestWorkerConfig};
pub use sink::LogDocumentSink;
