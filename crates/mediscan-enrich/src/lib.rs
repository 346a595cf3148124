//! Enrichment of clinical results with a narrative summary, reference
//! resources, and extracted keywords.
//!
//! Three independent providers are called concurrently under per-provider
//! timeouts and one outer deadline. Every slot that a provider cannot fill
//! in time is filled by a deterministic local fallback, so
//! [`EnrichmentOrchestrator::enrich`] never fails.

pub mod error;
pub mod fallback;
pub mod keywords;
pub mod orchestrator;
pub mod provider;
pub mod resources;
pub mod summary;
pub mod types;

pub use error::{EnrichError, ProviderError};
pub use keywords::LexiconKeywordProvider;
pub use orchestrator::EnrichmentOrchestrator;
pub use provider::{EnrichmentProvider, ProviderPayload};
pub use resources::WebSearchResourceProvider;
pub use summary::ChatCompletionSummaryProvider;
pub use types::{
    AnalysisKind, DataSources, EnrichmentRequest, EnrichmentResult, EnrichmentStatus, Keywords,
    Resource, SlotSource, Summary,
};
