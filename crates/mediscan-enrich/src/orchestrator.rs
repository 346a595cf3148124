//! Enrichment orchestrator: concurrent provider calls under per-provider
//! timeouts and one outer deadline, with a deterministic fallback per slot.

use std::sync::Arc;
use std::time::Duration;

use mediscan_core::config::{EnrichmentConfig, MediscanConfig};
use mediscan_core::Timestamp;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::EnrichError;
use crate::fallback;
use crate::keywords::LexiconKeywordProvider;
use crate::provider::{EnrichmentProvider, ProviderPayload};
use crate::resources::WebSearchResourceProvider;
use crate::summary::ChatCompletionSummaryProvider;
use crate::types::{
    DataSources, EnrichmentRequest, EnrichmentResult, Keywords, Resource, SlotSource, Summary,
};

type SharedProvider<T> = Arc<dyn EnrichmentProvider<Output = T>>;

/// Result of one provider call. Collapsed to a payload before leaving this module.
#[derive(Debug)]
pub(crate) enum ProviderOutcome<T> {
    Success(T),
    Timeout,
    Failure(String),
}

/// Calls the summary, resource, and keyword providers concurrently.
///
/// `enrich` never fails and returns within the outer deadline regardless of
/// provider behavior.
pub struct EnrichmentOrchestrator {
    summary: SharedProvider<Summary>,
    resources: SharedProvider<Vec<Resource>>,
    keywords: SharedProvider<Keywords>,
    provider_timeout: Duration,
    outer_deadline: Duration,
    max_resources: usize,
    max_keywords_per_category: usize,
}

impl EnrichmentOrchestrator {
    /// Create an orchestrator over explicit provider handles.
    ///
    /// Fails if the provider timeout is not strictly below the outer deadline.
    pub fn new(
        config: &EnrichmentConfig,
        summary: SharedProvider<Summary>,
        resources: SharedProvider<Vec<Resource>>,
        keywords: SharedProvider<Keywords>,
    ) -> Result<Self, EnrichError> {
        if config.provider_timeout_ms == 0 || config.outer_deadline_ms <= config.provider_timeout_ms
        {
            return Err(EnrichError::InvalidBudget(format!(
                "provider timeout {}ms must be positive and below the outer deadline {}ms",
                config.provider_timeout_ms, config.outer_deadline_ms
            )));
        }
        Ok(Self {
            summary,
            resources,
            keywords,
            provider_timeout: Duration::from_millis(config.provider_timeout_ms),
            outer_deadline: Duration::from_millis(config.outer_deadline_ms),
            max_resources: config.max_resources.max(1),
            max_keywords_per_category: config.max_keywords_per_category.max(1),
        })
    }

    /// Wire the HTTP summary and resource providers and the local lexicon.
    pub fn from_config(config: &MediscanConfig) -> Result<Self, EnrichError> {
        let summary = Arc::new(ChatCompletionSummaryProvider::from_config(&config.providers));
        let resources = Arc::new(WebSearchResourceProvider::from_config(
            &config.providers,
            config.enrichment.max_resources,
        ));
        let keywords = Arc::new(LexiconKeywordProvider::new(
            config.enrichment.max_keywords_per_category,
        ));
        Self::new(&config.enrichment, summary, resources, keywords)
    }

    pub fn outer_deadline(&self) -> Duration {
        self.outer_deadline
    }

    /// Enrich a clinical result. Always returns populated data.
    pub async fn enrich(&self, request: EnrichmentRequest) -> EnrichmentResult {
        let started = Instant::now();
        let deadline = started + self.outer_deadline;
        let request = Arc::new(request);

        let summary_task = spawn_provider(
            Arc::clone(&self.summary),
            Arc::clone(&request),
            self.provider_timeout,
        );
        let resources_task = spawn_provider(
            Arc::clone(&self.resources),
            Arc::clone(&request),
            self.provider_timeout,
        );
        let keywords_task = spawn_provider(
            Arc::clone(&self.keywords),
            Arc::clone(&request),
            self.provider_timeout,
        );

        let (summary_outcome, resources_outcome, keywords_outcome) = tokio::join!(
            join_by(summary_task, deadline),
            join_by(resources_task, deadline),
            join_by(keywords_task, deadline),
        );

        let (summary, summary_source) = resolve(self.summary.name(), summary_outcome, || {
            fallback::summary(&request)
        });
        let (mut resources, resources_source) =
            resolve(self.resources.name(), resources_outcome, || {
                fallback::resources(&request)
            });
        let (mut keywords, keywords_source) =
            resolve(self.keywords.name(), keywords_outcome, || {
                fallback::keywords(&request)
            });

        resources.truncate(self.max_resources);
        keywords.truncate(self.max_keywords_per_category);

        let sources = DataSources {
            summary: summary_source,
            resources: resources_source,
            keywords: keywords_source,
        };
        let status = sources.status();

        tracing::info!(
            subject = %request.subject_label(),
            kind = request.kind.as_str(),
            status = ?status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Enrichment complete"
        );

        EnrichmentResult {
            summary,
            resources,
            keywords,
            sources,
            status,
            generated_at: Timestamp::now(),
        }
    }
}

/// Spawn one provider call wrapped in its own timeout.
fn spawn_provider<T: ProviderPayload>(
    provider: SharedProvider<T>,
    request: Arc<EnrichmentRequest>,
    timeout: Duration,
) -> JoinHandle<ProviderOutcome<T>> {
    tokio::spawn(async move {
        match tokio::time::timeout(timeout, provider.fetch(&request)).await {
            Ok(Ok(payload)) if payload.is_empty_payload() => {
                ProviderOutcome::Failure("empty payload".to_string())
            }
            Ok(Ok(payload)) => ProviderOutcome::Success(payload),
            Ok(Err(e)) => ProviderOutcome::Failure(e.to_string()),
            Err(_) => ProviderOutcome::Timeout,
        }
    })
}

/// Await a provider task until `deadline`. A task still running at the
/// deadline is aborted and its eventual result is never observed.
async fn join_by<T>(
    mut handle: JoinHandle<ProviderOutcome<T>>,
    deadline: Instant,
) -> ProviderOutcome<T> {
    match tokio::time::timeout_at(deadline, &mut handle).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join_err)) => {
            ProviderOutcome::Failure(format!("provider task failed: {join_err}"))
        }
        Err(_) => {
            handle.abort();
            ProviderOutcome::Timeout
        }
    }
}

/// Collapse an outcome to a payload, substituting the fallback on anything
/// but success.
fn resolve<T>(
    provider: &str,
    outcome: ProviderOutcome<T>,
    fallback: impl FnOnce() -> T,
) -> (T, SlotSource) {
    match outcome {
        ProviderOutcome::Success(payload) => {
            tracing::debug!(provider, "Provider succeeded");
            (payload, SlotSource::Provider)
        }
        ProviderOutcome::Timeout => {
            tracing::warn!(provider, "Provider timed out, using fallback");
            (fallback(), SlotSource::Fallback)
        }
        ProviderOutcome::Failure(reason) => {
            tracing::warn!(provider, reason = %reason, "Provider failed, using fallback");
            (fallback(), SlotSource::Fallback)
        }
    }
}
