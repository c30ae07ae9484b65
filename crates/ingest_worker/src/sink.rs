use async_trait::async_trait;
use common::domain::{DocumentSink, DomainError, DomainResult, NormalizedDocument};
use tracing::info;

/// Sink that logs each normalized document. Downstream persistence is wired
/// by the surrounding application; this is the default stand-in.
pub struct LogDocumentSink;

#[async_trait]
impl DocumentSink for LogDocumentSink {
    async fn deliver(&self, document: &NormalizedDocument) -> DomainResult<()> {
        let rendered = serde_json::to_string(document)
            .map_err(|e| DomainError::DeliveryFailed(e.to_string()))?;
        info!(document = %rendered, "normalized document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_log_sink_accepts_documents() {
        let sink = LogDocumentSink;
        let document = NormalizedDocument {
            time: "2023-08-25T16:02:10+00:00".to_string(),
            data: BTreeMap::new(),
        };

        assert!(sink.deliver(&document).await.is_ok());
    }
}
