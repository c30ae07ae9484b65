use thiserror::Error;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing or non-numeric timestamp field 't'")]
    MissingTimestamp,

    #[error("missing or non-array readings field 'r'")]
    MissingReadings,

    #[error("reading at index {0} is not a JSON object")]
    InvalidReading(usize),

    #[error("timestamp {0} is outside the representable range")]
    TimestampOutOfRange(f64),
}

pub type Result<T> = std::result::Result<T, PayloadError>;
