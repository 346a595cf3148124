//! End-to-end intake conversations through the triage service.
//!
//! Each test drives its own in-memory service, one message at a time, the
//! way a transport layer would.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mediscan_core::config::{EnrichmentConfig, TriageConfig};
use mediscan_core::{AssessmentStage, Fact, Symptom, UrgencyLevel};
use mediscan_enrich::{
    EnrichmentOrchestrator, EnrichmentProvider, EnrichmentRequest, EnrichmentStatus, Keywords,
    LexiconKeywordProvider, ProviderError, Resource, Summary,
};
use mediscan_triage::{RuleBook, TriageService, TurnReply, TurnRequest};

// =============================================================================
// Helpers
// =============================================================================

fn service() -> TriageService {
    TriageService::new(TriageConfig::default(), RuleBook::builtin().unwrap())
}

fn service_with(config: TriageConfig) -> TriageService {
    TriageService::new(config, RuleBook::builtin().unwrap())
}

async fn say(svc: &TriageService, session: &str, text: &str) -> TurnReply {
    svc.handle_message(session, text).await.unwrap()
}

/// Summary provider that never answers.
struct Silent;

#[async_trait]
impl EnrichmentProvider for Silent {
    type Output = Summary;
    fn name(&self) -> &'static str {
        "summary"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Summary, ProviderError> {
        std::future::pending().await
    }
}

/// Resource provider that is unreachable.
struct Offline;

#[async_trait]
impl EnrichmentProvider for Offline {
    type Output = Vec<Resource>;
    fn name(&self) -> &'static str {
        "resources"
    }
    async fn fetch(&self, _request: &EnrichmentRequest) -> Result<Vec<Resource>, ProviderError> {
        Err(ProviderError::NotConfigured("search key missing".to_string()))
    }
}

fn offline_enricher() -> Arc<EnrichmentOrchestrator> {
    let budget = EnrichmentConfig {
        provider_timeout_ms: 50,
        outer_deadline_ms: 150,
        ..EnrichmentConfig::default()
    };
    let keywords: Arc<dyn EnrichmentProvider<Output = Keywords>> =
        Arc::new(LexiconKeywordProvider::default());
    Arc::new(
        EnrichmentOrchestrator::new(&budget, Arc::new(Silent), Arc::new(Offline), keywords)
            .unwrap(),
    )
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_fever_of_103_is_an_emergency() {
    let svc = service();
    let reply = say(&svc, "fever-103", "I have a fever of 103").await;

    assert_eq!(reply.urgency_level, UrgencyLevel::Emergency);
    assert_eq!(reply.primary_symptom, Symptom::Fever);
    assert_eq!(reply.pending_questions.len(), 1);
    assert!(!reply.pending_questions[0].contains("temperature"));
    assert!(reply.response_text.contains("911"));
}

#[tokio::test]
async fn test_mild_headache_is_routine_and_asks_severity() {
    let svc = service();
    let reply = say(&svc, "mild-headache", "mild headache, started today").await;

    assert_eq!(reply.urgency_level, UrgencyLevel::Routine);
    assert_eq!(reply.primary_symptom, Symptom::Headache);
    assert_eq!(reply.pending_questions.len(), 1);
    assert!(reply.pending_questions[0].contains("1-10"));
    assert!(reply.red_flags.is_empty());
}

#[tokio::test]
async fn test_no_after_temperature_question_marks_temperature() {
    let svc = service();
    let first = say(&svc, "fever-no", "I have a fever").await;
    assert_eq!(
        first.pending_questions,
        vec!["Have you taken your temperature? What was the reading?"]
    );

    say(&svc, "fever-no", "no").await;
    let summary = svc.session_summary("fever-no").await.unwrap();
    assert!(summary.collected.iter().any(|c| c.fact == Fact::Temperature));

    // Walk the rest of the conversation; the temperature question never returns.
    for text in ["two days", "yes some chills", "no", "hmm", "hmm", "yes"] {
        let reply = say(&svc, "fever-no", text).await;
        assert!(
            reply
                .pending_questions
                .iter()
                .all(|q| !q.contains("temperature")),
            "temperature asked again after {:?}",
            text
        );
    }
}

#[tokio::test]
async fn test_resolution_lowers_urgency_but_keeps_red_flags() {
    let svc = service();
    let first = say(&svc, "resolved", "chest pain").await;
    assert_eq!(first.urgency_level, UrgencyLevel::Emergency);
    assert_eq!(
        first.red_flags,
        vec!["Chest pain - potential cardiac emergency"]
    );

    let second = say(&svc, "resolved", "it's gone now, I feel fine").await;
    assert_eq!(second.urgency_level, UrgencyLevel::Routine);
    assert!(second
        .red_flags
        .contains(&"Chest pain - potential cardiac emergency".to_string()));

    // Earlier messages no longer raise urgency once resolution was reported.
    let third = say(&svc, "resolved", "no").await;
    assert_eq!(third.urgency_level, UrgencyLevel::Routine);
}

#[tokio::test]
async fn test_negated_resolution_keeps_urgency() {
    for (i, text) in [
        "I don't feel better at all",
        "it has not resolved",
        "I'm not feeling better",
        "it hasn't gone away",
    ]
    .iter()
    .enumerate()
    {
        let svc = service();
        let session = format!("unresolved-{}", i);
        let first = say(&svc, &session, "I have chest pain").await;
        assert_eq!(first.urgency_level, UrgencyLevel::Emergency);

        let reply = say(&svc, &session, text).await;
        assert_eq!(reply.urgency_level, UrgencyLevel::Emergency, "{}", text);

        // The urgency window was not restarted either.
        let reply = say(&svc, &session, "no").await;
        assert_eq!(reply.urgency_level, UrgencyLevel::Emergency, "{}", text);
    }
}

#[tokio::test]
async fn test_negative_worded_resolution_lowers_urgency() {
    let svc = service();
    say(&svc, "no-longer", "chest pain").await;
    let reply = say(&svc, "no-longer", "it no longer hurts").await;
    assert_eq!(reply.urgency_level, UrgencyLevel::Routine);
}

#[tokio::test]
async fn test_resolution_ignored_when_de_escalation_disabled() {
    let svc = service_with(TriageConfig {
        allow_de_escalation: false,
        ..TriageConfig::default()
    });
    say(&svc, "sticky", "chest pain").await;
    let reply = say(&svc, "sticky", "it's gone now, I feel fine").await;
    assert_eq!(reply.urgency_level, UrgencyLevel::Emergency);
}

// =============================================================================
// Full conversations
// =============================================================================

#[tokio::test]
async fn test_headache_conversation_reaches_final_disposition() {
    let svc = service();
    let script = [
        "I've had a headache",
        "about a 4",
        "on my forehead",
        "it's dull",
        "started yesterday afternoon",
        "no, nothing else",
        "I took ibuprofen",
    ];

    let mut last = None;
    for text in script {
        let reply = say(&svc, "headache-full", text).await;
        if reply.stage.is_final() {
            last = Some(reply);
            break;
        }
        last = Some(reply);
    }
    let reply = last.unwrap();

    assert_eq!(reply.stage, AssessmentStage::FinalAssessment);
    assert_eq!(reply.urgency_level, UrgencyLevel::Routine);
    assert!(reply.pending_questions.is_empty());
    assert!(reply.response_text.starts_with("✅ **ROUTINE PRIORITY**"));
    assert!(reply.response_text.contains("Severity: 4/10"));
    assert!(reply.response_text.contains("**Recommended next steps:**"));
}

#[tokio::test]
async fn test_stage_progression_is_linear() {
    let svc = service();
    let script = [
        "I have a cough",
        "for 3 days",
        "green phlegm",
        "at rest it's fine",
        "runny nose",
        "took some cough medicine",
        "I smoke",
    ];
    let mut previous = AssessmentStage::InitialPresentation;
    for text in script {
        let reply = say(&svc, "linear", text).await;
        assert!(reply.stage >= previous, "stage went backward on {:?}", text);
        assert!(
            reply.stage == previous || reply.stage == previous.next() || reply.stage.is_final(),
            "stage skipped from {} to {} on {:?}",
            previous,
            reply.stage,
            text
        );
        previous = reply.stage;
    }
    assert_eq!(previous, AssessmentStage::FinalAssessment);
}

#[tokio::test]
async fn test_final_turn_attaches_enrichment_separately() {
    let config = TriageConfig {
        max_turns: 2,
        ..TriageConfig::default()
    };
    let svc = service_with(config).with_enricher(offline_enricher());

    let first = svc
        .handle_turn(TurnRequest::new("enriched", "I have a fever of 101").with_enrichment())
        .await
        .unwrap();
    assert!(first.enrichment.is_none(), "only final turns are enriched");

    let started = std::time::Instant::now();
    let reply = svc
        .handle_turn(
            TurnRequest::new("enriched", "since yesterday")
                .with_enrichment()
                .with_context("patient is 34"),
        )
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_millis(400));

    assert_eq!(reply.stage, AssessmentStage::FinalAssessment);
    let enrichment = reply.enrichment.expect("final turn is enriched");
    assert!(!enrichment.summary.text.is_empty());
    assert!(!enrichment.resources.is_empty());
    assert!(!enrichment.keywords.is_empty());
    assert_ne!(enrichment.status, EnrichmentStatus::Complete);
    assert!(!reply.response_text.contains(&enrichment.summary.text));
}

#[tokio::test]
async fn test_history_and_unknown_session() {
    let svc = service();
    say(&svc, "hist", "I feel dizzy").await;
    say(&svc, "hist", "when I stand up").await;

    let history = svc.history("hist").await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[2].text, "when I stand up");

    let err = svc.history("never-seen").await.unwrap_err();
    assert!(matches!(
        err,
        mediscan_triage::TriageError::UnknownSession(_)
    ));
}
