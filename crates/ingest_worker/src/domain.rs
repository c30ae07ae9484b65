mod snapshot_service;

pub use snapshot_service::*;
