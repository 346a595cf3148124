//! Triage service: the boundary between callers and the intake engine.
//!
//! Validates input, runs one turn under the session lock, and optionally
//! enriches the final disposition after the lock is released.

use std::sync::Arc;

use mediscan_core::config::{MediscanConfig, TriageConfig};
use mediscan_core::{RiskLevel, SessionId, Symptom};
use mediscan_enrich::{AnalysisKind, EnrichmentOrchestrator, EnrichmentRequest, EnrichmentResult};

use crate::composer::ResponseComposer;
use crate::engine::AssessmentEngine;
use crate::error::TriageError;
use crate::rules::RuleBook;
use crate::store::SessionStore;
use crate::types::{AssessmentResult, Message, SessionSummary, TurnReply, TurnRequest};

pub struct TriageService {
    store: Arc<SessionStore>,
    engine: AssessmentEngine,
    composer: ResponseComposer,
    enricher: Option<Arc<EnrichmentOrchestrator>>,
}

impl TriageService {
    /// Create a service without enrichment.
    pub fn new(config: TriageConfig, rules: RuleBook) -> Self {
        let rules = Arc::new(rules);
        Self {
            store: Arc::new(SessionStore::new()),
            composer: ResponseComposer::new(Arc::clone(&rules)),
            engine: AssessmentEngine::new(config, rules),
            enricher: None,
        }
    }

    /// Build the service, its rule book, and the enrichment orchestrator
    /// from configuration.
    pub fn from_config(config: &MediscanConfig) -> Result<Self, TriageError> {
        let rules = RuleBook::load_or_builtin(config.triage.rules_path.as_deref())?;
        let enricher = EnrichmentOrchestrator::from_config(config)
            .map_err(|e| TriageError::Config(e.to_string()))?;
        Ok(Self::new(config.triage.clone(), rules).with_enricher(Arc::new(enricher)))
    }

    pub fn with_enricher(mut self, enricher: Arc<EnrichmentOrchestrator>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Handle one patient message without enrichment.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<TurnReply, TriageError> {
        self.handle_turn(TurnRequest::new(session_id, message)).await
    }

    /// Handle one patient turn.
    ///
    /// Turns on the same session are applied one at a time in arrival order.
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnReply, TriageError> {
        let id = SessionId::new(request.session_id.as_str())?;
        let message = request.message.trim();
        if message.is_empty() {
            return Err(TriageError::EmptyMessage);
        }
        let max_len = self.engine.config().max_message_length;
        if message.chars().count() > max_len {
            return Err(TriageError::MessageTooLong(max_len));
        }

        let (result, response_text) = {
            let mut turn = self.store.begin_turn(&id).await?;
            turn.append_message(Message::patient(message));
            let result = self.engine.assess(&mut turn, message);
            let response_text = self.composer.compose(&result);
            turn.append_message(Message::system(
                response_text.clone(),
                result.pending_questions.clone(),
            ));
            (result, response_text)
        };

        let enrichment = if request.enrich && result.stage.is_final() {
            self.enrich(&result, request.context).await
        } else {
            None
        };

        Ok(TurnReply {
            session_id: id.to_string(),
            response_text,
            urgency_level: result.urgency_level,
            stage: result.stage,
            primary_symptom: result.primary_symptom,
            pending_questions: result
                .pending_questions
                .into_iter()
                .map(|q| q.text)
                .collect(),
            red_flags: result.red_flags,
            next_steps: result.next_steps,
            enrichment,
        })
    }

    async fn enrich(
        &self,
        result: &AssessmentResult,
        context: Option<String>,
    ) -> Option<EnrichmentResult> {
        let Some(enricher) = self.enricher.as_ref() else {
            tracing::warn!("Enrichment requested but no orchestrator is configured");
            return None;
        };
        let request = self.enrichment_request(result, context);
        Some(enricher.enrich(request).await)
    }

    /// Enrichment input derived from a final assessment.
    ///
    /// Confidence is the share of the fact threshold that was collected.
    pub fn enrichment_request(
        &self,
        result: &AssessmentResult,
        context: Option<String>,
    ) -> EnrichmentRequest {
        let subject = match result.primary_symptom {
            Symptom::General => "general symptoms".to_string(),
            other => other.display_name(),
        };
        let threshold = self.engine.config().final_fact_threshold.max(1);
        let confidence = (result.collected.len() as f32 / threshold as f32).min(1.0);

        let mut extra = Vec::new();
        if !result.red_flags.is_empty() {
            extra.push(format!("Warning signs: {}", result.red_flags.join("; ")));
        }
        if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
            extra.push(ctx);
        }

        let request = EnrichmentRequest::new(
            subject,
            confidence,
            RiskLevel::from(result.urgency_level),
        )
        .with_kind(AnalysisKind::Triage)
        .with_recommendations(result.next_steps.clone());
        if extra.is_empty() {
            request
        } else {
            request.with_context(extra.join("\n"))
        }
    }

    /// Full transcript of a session, oldest first.
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>, TriageError> {
        let id = SessionId::new(session_id)?;
        Ok(self.store.snapshot(&id).await?.messages)
    }

    pub async fn session_summary(&self, session_id: &str) -> Result<SessionSummary, TriageError> {
        let id = SessionId::new(session_id)?;
        let session = self.store.snapshot(&id).await?;
        Ok(SessionSummary::from(&session))
    }
}
