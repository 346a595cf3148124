//! Provider trait shared by the summary, resource, and keyword clients.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{EnrichmentRequest, Keywords, Resource, Summary};

/// Payloads a provider may return. An empty payload is treated as a failure.
pub trait ProviderPayload: Send + 'static {
    fn is_empty_payload(&self) -> bool;
}

impl ProviderPayload for Summary {
    fn is_empty_payload(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl ProviderPayload for Vec<Resource> {
    fn is_empty_payload(&self) -> bool {
        self.iter().all(|r| r.url.trim().is_empty())
    }
}

impl ProviderPayload for Keywords {
    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }
}

/// One enrichment source. Implementations are stateless and shared via `Arc`.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    type Output: ProviderPayload;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Make one attempt. No retries.
    async fn fetch(&self, request: &EnrichmentRequest) -> Result<Self::Output, ProviderError>;
}
