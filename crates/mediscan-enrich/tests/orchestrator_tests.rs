//! Integration tests for the enrichment orchestrator's latency and
//! non-emptiness guarantees.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use mediscan_core::config::EnrichmentConfig;
use mediscan_core::RiskLevel;
use mediscan_enrich::{
    AnalysisKind, EnrichmentOrchestrator, EnrichmentProvider, EnrichmentRequest,
    EnrichmentStatus, Keywords, ProviderError, Resource, SlotSource, Summary,
};

// =============================================================================
// Test providers
// =============================================================================

/// Never completes.
struct Hanging<T> {
    calls: Arc<AtomicUsize>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Hanging<T> {
    fn new(calls: Arc<AtomicUsize>) -> Self {
        Self {
            calls,
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl EnrichmentProvider for Hanging<Summary> {
    type Output = Summary;
    fn name(&self) -> &'static str {
        "summary"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Summary, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[async_trait]
impl EnrichmentProvider for Hanging<Vec<Resource>> {
    type Output = Vec<Resource>;
    fn name(&self) -> &'static str {
        "resources"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Vec<Resource>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

#[async_trait]
impl EnrichmentProvider for Hanging<Keywords> {
    type Output = Keywords;
    fn name(&self) -> &'static str {
        "keywords"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Keywords, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

/// Sleeps past the provider timeout, then succeeds.
struct Slow;

#[async_trait]
impl EnrichmentProvider for Slow {
    type Output = Summary;
    fn name(&self) -> &'static str {
        "summary"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Summary, ProviderError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Summary {
            text: "late summary".to_string(),
            ..Summary::default()
        })
    }
}

/// Fails immediately.
struct Broken;

#[async_trait]
impl EnrichmentProvider for Broken {
    type Output = Keywords;
    fn name(&self) -> &'static str {
        "keywords"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Keywords, ProviderError> {
        Err(ProviderError::Http("connection refused".to_string()))
    }
}

fn budget() -> EnrichmentConfig {
    EnrichmentConfig {
        provider_timeout_ms: 80,
        outer_deadline_ms: 200,
        max_resources: 5,
        max_keywords_per_category: 8,
    }
}

fn hanging_orchestrator(calls: &Arc<AtomicUsize>) -> EnrichmentOrchestrator {
    EnrichmentOrchestrator::new(
        &budget(),
        Arc::new(Hanging::<Summary>::new(Arc::clone(calls))),
        Arc::new(Hanging::<Vec<Resource>>::new(Arc::clone(calls))),
        Arc::new(Hanging::<Keywords>::new(Arc::clone(calls))),
    )
    .unwrap()
}

fn assert_populated(result: &mediscan_enrich::EnrichmentResult) {
    assert!(!result.summary.text.is_empty());
    assert!(!result.summary.confidence_note.is_empty());
    assert!(!result.summary.risk_note.is_empty());
    assert!(!result.resources.is_empty());
    assert!(!result.keywords.is_empty());
}

// =============================================================================
// Deadline and fallback
// =============================================================================

#[tokio::test]
async fn test_all_providers_hang_returns_fallback_before_deadline() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = hanging_orchestrator(&calls);

    let started = Instant::now();
    let result = orchestrator
        .enrich(EnrichmentRequest::new("melanoma", 0.91, RiskLevel::High))
        .await;
    let elapsed = started.elapsed();

    assert!(
        elapsed < orchestrator.outer_deadline() + Duration::from_millis(100),
        "enrich took {:?}",
        elapsed
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3, "each provider called once");
    assert_eq!(result.status, EnrichmentStatus::Fallback);
    assert_populated(&result);
    assert!(result.summary.text.starts_with("Melanoma identified"));
}

#[tokio::test]
async fn test_fallback_for_every_kind_is_populated() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = hanging_orchestrator(&calls);

    for (subject, kind) in [
        ("", AnalysisKind::Skin),
        ("pneumonia", AnalysisKind::Radiology),
        ("dizziness", AnalysisKind::Triage),
        ("unheard-of condition", AnalysisKind::Skin),
    ] {
        let result = orchestrator
            .enrich(EnrichmentRequest::new(subject, 0.2, RiskLevel::Low).with_kind(kind))
            .await;
        assert_populated(&result);
    }
}

#[tokio::test]
async fn test_late_result_is_discarded() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = EnrichmentOrchestrator::new(
        &budget(),
        Arc::new(Slow),
        Arc::new(Hanging::<Vec<Resource>>::new(Arc::clone(&calls))),
        Arc::new(Broken),
    )
    .unwrap();

    let result = orchestrator
        .enrich(EnrichmentRequest::new("nevus", 0.7, RiskLevel::Low))
        .await;

    assert_eq!(result.sources.summary, SlotSource::Fallback);
    assert_ne!(result.summary.text, "late summary");
    assert!(result.summary.text.starts_with("Nevus (mole) identified"));
    assert_populated(&result);

    // Even after the slow provider would have finished, the result is unchanged.
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_ne!(result.summary.text, "late summary");
}

#[tokio::test]
async fn test_concurrent_enrichments_share_providers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let orchestrator = Arc::new(hanging_orchestrator(&calls));

    let started = Instant::now();
    let mut handles = Vec::new();
    for i in 0..8 {
        let orchestrator = Arc::clone(&orchestrator);
        handles.push(tokio::spawn(async move {
            orchestrator
                .enrich(EnrichmentRequest::new(format!("subject {i}"), 0.5, RiskLevel::Medium))
                .await
        }));
    }
    for handle in handles {
        let result = handle.await.unwrap();
        assert_populated(&result);
    }

    // Concurrent, not sequential: eight calls finish well inside two deadlines.
    assert!(started.elapsed() < Duration::from_millis(400));
    assert_eq!(calls.load(Ordering::SeqCst), 24);
}
