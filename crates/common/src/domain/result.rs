use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Malformed snapshot payload: {0}")]
    MalformedPayload(String),

    #[error("Invalid broker configuration: {0}")]
    InvalidBrokerConfig(String),

    #[error("Document delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Transport error: {0}")]
    TransportError(#[from] anyhow::Error),
}
