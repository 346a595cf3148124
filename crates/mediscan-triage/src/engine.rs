//! Assessment engine: turns one patient message into an assessment.
//!
//! The engine is synchronous and deterministic. It reads and writes session
//! state only through a [`SessionTurn`], which the caller holds for the
//! whole turn.

use std::sync::Arc;

use mediscan_core::config::TriageConfig;
use mediscan_core::{AssessmentStage, UrgencyLevel};

use crate::matcher::{self, PhraseMatcher};
use crate::rules::RuleBook;
use crate::store::SessionTurn;
use crate::symptom::SymptomIdentifier;
use crate::tracker::InfoTracker;
use crate::types::{AssessmentResult, PendingQuestion};
use crate::urgency::{RedFlagDetector, UrgencyClassifier};

/// Stage implied by the number of collected facts.
///
/// The first turn is always the initial presentation; reaching the fact
/// threshold finalizes.
pub fn target_stage(first_turn: bool, fact_count: usize, final_threshold: usize) -> AssessmentStage {
    if fact_count >= final_threshold {
        return AssessmentStage::FinalAssessment;
    }
    if first_turn {
        return AssessmentStage::InitialPresentation;
    }
    match fact_count {
        0 | 1 => AssessmentStage::SymptomCharacterization,
        2 | 3 => AssessmentStage::AssociatedSymptoms,
        _ => AssessmentStage::MedicalHistory,
    }
}

pub struct AssessmentEngine {
    rules: Arc<RuleBook>,
    matcher: PhraseMatcher,
    config: TriageConfig,
}

impl AssessmentEngine {
    pub fn new(config: TriageConfig, rules: Arc<RuleBook>) -> Self {
        let matcher = PhraseMatcher::new(&rules.urgency.negations);
        Self {
            rules,
            matcher,
            config,
        }
    }

    pub fn rules(&self) -> &Arc<RuleBook> {
        &self.rules
    }

    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Assess the latest patient message, which the caller has already
    /// appended to the session.
    pub fn assess(&self, turn: &mut SessionTurn, message: &str) -> AssessmentResult {
        let text = matcher::normalize(message);
        let first_turn = turn.session().patient_turns <= 1;

        // Symptom
        let history: Vec<String> = turn
            .prior_patient_texts(self.config.history_window)
            .into_iter()
            .map(matcher::normalize)
            .collect();
        let identifier = SymptomIdentifier::new(&self.rules, &self.matcher);
        let mentions_symptom = identifier.in_text(&text).is_some();
        let symptom = identifier.identify(&text, &history);
        turn.set_primary_symptom(symptom);

        // Facts
        let pending = turn.session().last_question().cloned();
        let times_asked = pending
            .as_ref()
            .and_then(|q| q.fact)
            .map_or(0, |fact| turn.session().times_asked(fact));
        let inference = InfoTracker::new(&self.rules).infer(&text, pending.as_ref(), times_asked);
        turn.record_vitals(inference.vitals);

        let mut newly_collected = Vec::new();
        for collected in inference.facts {
            if turn.set_flag(collected.fact, collected.detail) {
                newly_collected.push(collected.fact);
            }
        }

        // Urgency
        let classifier = UrgencyClassifier::new(&self.rules, &self.matcher, &self.config);
        let de_escalation =
            self.config.allow_de_escalation && classifier.is_de_escalation(&text);
        let low_information = !matcher::has_content(&text)
            || (newly_collected.is_empty() && !mentions_symptom && !de_escalation);
        let assessment = if de_escalation {
            classifier.classify(&[text.as_str()], inference.vitals)
        } else {
            let texts: Vec<String> = turn
                .urgency_texts()
                .into_iter()
                .map(matcher::normalize)
                .collect();
            classifier.classify(&texts, turn.urgency_vitals())
        };
        let urgency_level = turn.set_urgency(assessment.level, de_escalation);
        if let Some(ref reason) = assessment.reason {
            tracing::debug!(level = %assessment.level, reason = %reason, "Urgency rule matched");
        }

        // Red flags over the whole conversation
        let all_texts: Vec<String> = turn
            .patient_texts()
            .into_iter()
            .map(matcher::normalize)
            .collect();
        let red_flags = RedFlagDetector::new(&self.rules, &self.matcher, &self.config)
            .detect(&all_texts, turn.peak_vitals());

        // Stage and next question
        let protocol = self.rules.protocol(symptom);
        let next_question = protocol
            .questions
            .iter()
            .find(|q| !turn.get_flag(q.fact));
        let session = turn.session();
        let current = session.current_stage;
        let target = target_stage(
            first_turn,
            session.collected.len(),
            self.config.final_fact_threshold,
        );
        let finalize = target.is_final()
            || next_question.is_none()
            || session.patient_turns >= self.config.max_turns;

        let stage = if current.is_final() || finalize {
            AssessmentStage::FinalAssessment
        } else if low_information || target <= current {
            current
        } else {
            current.next()
        };

        let pending_questions = if stage.is_final() {
            Vec::new()
        } else if low_information {
            vec![pending
                .filter(|q| q.fact.is_some_and(|f| !turn.get_flag(f)))
                .unwrap_or_else(|| PendingQuestion {
                    fact: None,
                    text: self.rules.messages.clarifying_question.clone(),
                })]
        } else {
            next_question
                .map(|q| PendingQuestion {
                    fact: Some(q.fact),
                    text: q.text.clone(),
                })
                .into_iter()
                .collect()
        };
        let stage = turn.set_stage(stage);

        let session = turn.session();
        tracing::info!(
            session_id = %session.id,
            symptom = %symptom,
            stage = %stage,
            urgency = %urgency_level,
            facts = session.collected.len(),
            new_facts = newly_collected.len(),
            low_information,
            "Turn assessed"
        );

        AssessmentResult {
            primary_symptom: symptom,
            stage,
            urgency_level,
            red_flags,
            pending_questions,
            next_steps: self.rules.next_steps(urgency_level).to_vec(),
            collected: session.collected_facts(),
            newly_collected,
            first_turn,
            low_information,
        }
    }

    /// Next steps for a level, without assessing a turn.
    pub fn next_steps(&self, level: UrgencyLevel) -> Vec<String> {
        self.rules.next_steps(level).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SessionStore;
    use crate::types::Message;
    use mediscan_core::{Fact, SessionId, Symptom};

    fn engine() -> AssessmentEngine {
        AssessmentEngine::new(
            TriageConfig::default(),
            Arc::new(RuleBook::builtin().unwrap()),
        )
    }

    /// Run one turn the way the service does: append, assess, append reply.
    async fn turn(
        store: &SessionStore,
        engine: &AssessmentEngine,
        id: &SessionId,
        text: &str,
    ) -> AssessmentResult {
        let mut t = store.begin_turn(id).await.unwrap();
        t.append_message(Message::patient(text));
        let result = engine.assess(&mut t, text);
        t.append_message(Message::system("reply", result.pending_questions.clone()));
        result
    }

    #[test]
    fn test_target_stage() {
        use AssessmentStage::*;
        assert_eq!(target_stage(true, 0, 6), InitialPresentation);
        assert_eq!(target_stage(true, 3, 6), InitialPresentation);
        assert_eq!(target_stage(false, 1, 6), SymptomCharacterization);
        assert_eq!(target_stage(false, 2, 6), AssociatedSymptoms);
        assert_eq!(target_stage(false, 5, 6), MedicalHistory);
        assert_eq!(target_stage(false, 6, 6), FinalAssessment);
        assert_eq!(target_stage(true, 6, 6), FinalAssessment);
    }

    #[tokio::test]
    async fn test_first_turn_fever_with_reading() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e1").unwrap();

        let r = turn(&store, &engine, &id, "I have a fever of 103").await;
        assert_eq!(r.primary_symptom, Symptom::Fever);
        assert_eq!(r.stage, AssessmentStage::InitialPresentation);
        assert_eq!(r.urgency_level, UrgencyLevel::Emergency);
        assert!(r.first_turn);
        assert_eq!(r.newly_collected, vec![Fact::Temperature]);
        assert_eq!(r.pending_questions.len(), 1);
        assert_eq!(r.pending_questions[0].fact, Some(Fact::Duration));
    }

    #[tokio::test]
    async fn test_stage_advances_one_step() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e2").unwrap();

        turn(&store, &engine, &id, "I have a fever").await;
        // Three facts at once would target associated symptoms; only one step is taken.
        let r = turn(&store, &engine, &id, "fever of 101 for 2 days with chills").await;
        assert_eq!(r.collected.len(), 3);
        assert_eq!(r.stage, AssessmentStage::SymptomCharacterization);

        let r = turn(&store, &engine, &id, "no sore throat").await;
        assert_eq!(r.stage, AssessmentStage::AssociatedSymptoms);
    }

    #[tokio::test]
    async fn test_low_information_turn_reasks() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e3").unwrap();

        let first = turn(&store, &engine, &id, "I have a headache").await;
        let asked = first.pending_questions[0].clone();

        let r = turn(&store, &engine, &id, "hmm").await;
        assert!(r.low_information);
        assert!(r.newly_collected.is_empty());
        assert_eq!(r.stage, AssessmentStage::InitialPresentation);
        assert_eq!(r.pending_questions, vec![asked]);
    }

    #[tokio::test]
    async fn test_low_information_first_turn_asks_clarifying_question() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e4").unwrap();

        let r = turn(&store, &engine, &id, "hello").await;
        assert!(r.low_information);
        assert_eq!(r.primary_symptom, Symptom::General);
        assert_eq!(r.pending_questions[0].fact, None);
        assert_eq!(
            r.pending_questions[0].text,
            "Can you describe your main symptom and when it started?"
        );
    }

    #[tokio::test]
    async fn test_punctuation_only_is_low_information() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e5").unwrap();

        turn(&store, &engine, &id, "I have a cough").await;
        let r = turn(&store, &engine, &id, "?!").await;
        assert!(r.low_information);
    }

    #[tokio::test]
    async fn test_reaching_threshold_finalizes() {
        let store = SessionStore::new();
        let engine = engine();
        let id = SessionId::new("e6").unwrap();

        turn(&store, &engine, &id, "I have a headache").await;
        let r = turn(
            &store,
            &engine,
            &id,
            "it's a 5/10, throbbing, on my forehead, started yesterday, took ibuprofen, and I have asthma",
        )
        .await;
        assert!(r.collected.len() >= 6);
        assert_eq!(r.stage, AssessmentStage::FinalAssessment);
        assert!(r.pending_questions.is_empty());
        assert!(!r.next_steps.is_empty());
    }

    #[tokio::test]
    async fn test_turn_ceiling_finalizes() {
        let store = SessionStore::new();
        let config = TriageConfig {
            max_turns: 3,
            ..TriageConfig::default()
        };
        let engine = AssessmentEngine::new(config, Arc::new(RuleBook::builtin().unwrap()));
        let id = SessionId::new("e7").unwrap();

        turn(&store, &engine, &id, "I feel off").await;
        turn(&store, &engine, &id, "hmm").await;
        let r = turn(&store, &engine, &id, "hmm").await;
        assert_eq!(r.stage, AssessmentStage::FinalAssessment);
    }

    #[tokio::test]
    async fn test_final_stays_final() {
        let store = SessionStore::new();
        let config = TriageConfig {
            max_turns: 1,
            ..TriageConfig::default()
        };
        let engine = AssessmentEngine::new(config, Arc::new(RuleBook::builtin().unwrap()));
        let id = SessionId::new("e8").unwrap();

        let r = turn(&store, &engine, &id, "I have a cough").await;
        assert_eq!(r.stage, AssessmentStage::FinalAssessment);
        let r = turn(&store, &engine, &id, "thanks").await;
        assert_eq!(r.stage, AssessmentStage::FinalAssessment);
        assert!(r.pending_questions.is_empty());
    }
}
