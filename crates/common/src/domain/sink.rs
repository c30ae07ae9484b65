use crate::domain::document::NormalizedDocument;
use crate::domain::result::DomainResult;
use async_trait::async_trait;

/// Trait for handing normalized documents to the downstream stage
///
/// Implementations should:
/// - Take ownership of delivery (log, publish, persist — whatever the
///   surrounding application wires in)
/// - Return DomainError on failure; the caller absorbs it (a failed
///   delivery never terminates the session)
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Deliver a single normalized document
    async fn deliver(&self, document: &NormalizedDocument) -> DomainResult<()>;
}
