//! Session, message, and turn types for the intake conversation.

use std::collections::{BTreeMap, BTreeSet};

use mediscan_core::{AssessmentStage, Fact, SessionId, Symptom, Timestamp, UrgencyLevel};
use mediscan_enrich::EnrichmentResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Messages
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    System,
}

/// A question put to the patient. `fact` is `None` for clarifying prompts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub fact: Option<Fact>,
    pub text: String,
}

/// Numeric readings extracted from one patient message.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_f: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
}

impl Vitals {
    pub fn is_empty(&self) -> bool {
        self.temperature_f.is_none() && self.severity.is_none()
    }

    /// Element-wise maximum.
    pub fn max(self, other: Vitals) -> Vitals {
        Vitals {
            temperature_f: match (self.temperature_f, other.temperature_f) {
                (Some(a), Some(b)) => Some(a.max(b)),
                (a, b) => a.or(b),
            },
            severity: self.severity.max(other.severity),
        }
    }
}

/// One message in a session transcript.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    pub timestamp: Timestamp,
    /// Questions asked in this message (system messages only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub questions: Vec<PendingQuestion>,
    /// Readings found in this message (patient messages only).
    #[serde(default, skip_serializing_if = "Vitals::is_empty")]
    pub vitals: Vitals,
}

impl Message {
    pub fn patient(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Patient,
            text: text.into(),
            timestamp: Timestamp::now(),
            questions: Vec::new(),
            vitals: Vitals::default(),
        }
    }

    pub fn system(text: impl Into<String>, questions: Vec<PendingQuestion>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::System,
            text: text.into(),
            timestamp: Timestamp::now(),
            questions,
            vitals: Vitals::default(),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Per-conversation state. Owned by the session store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: Timestamp,
    pub messages: Vec<Message>,
    pub collected: BTreeSet<Fact>,
    /// Patient wording behind each collected fact, where one was captured.
    pub fact_details: BTreeMap<Fact, String>,
    pub current_urgency: UrgencyLevel,
    pub current_stage: AssessmentStage,
    pub primary_symptom: Symptom,
    pub patient_turns: usize,
    /// Index into `messages` from which urgency is re-evaluated. Moves
    /// forward when the patient reports that symptoms have resolved.
    pub urgency_from: usize,
}

impl Session {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            created_at: Timestamp::now(),
            messages: Vec::new(),
            collected: BTreeSet::new(),
            fact_details: BTreeMap::new(),
            current_urgency: UrgencyLevel::Routine,
            current_stage: AssessmentStage::InitialPresentation,
            primary_symptom: Symptom::General,
            patient_turns: 0,
            urgency_from: 0,
        }
    }

    pub fn patient_messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.messages.iter().filter(|m| m.role == Role::Patient)
    }

    /// The most recent question asked by the system, if any.
    pub fn last_question(&self) -> Option<&PendingQuestion> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::System)
            .and_then(|m| m.questions.first())
    }

    /// How many times a question about `fact` has been asked.
    pub fn times_asked(&self, fact: Fact) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .flat_map(|m| m.questions.iter())
            .filter(|q| q.fact == Some(fact))
            .count()
    }

    /// Every question text asked so far.
    pub fn asked_questions(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::System)
            .flat_map(|m| m.questions.iter())
            .map(|q| q.text.as_str())
    }

    pub fn collected_facts(&self) -> Vec<CollectedFact> {
        self.collected
            .iter()
            .map(|fact| CollectedFact {
                fact: *fact,
                detail: self.fact_details.get(fact).cloned(),
            })
            .collect()
    }
}

/// A collected fact with the patient's wording, if captured.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedFact {
    pub fact: Fact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// =============================================================================
// Assessment
// =============================================================================

/// Outcome of assessing one patient turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub primary_symptom: Symptom,
    pub stage: AssessmentStage,
    pub urgency_level: UrgencyLevel,
    pub red_flags: Vec<String>,
    /// Zero or one question. Empty once the assessment is final.
    pub pending_questions: Vec<PendingQuestion>,
    pub next_steps: Vec<String>,
    pub collected: Vec<CollectedFact>,
    pub newly_collected: Vec<Fact>,
    pub first_turn: bool,
    pub low_information: bool,
}

// =============================================================================
// Service boundary
// =============================================================================

/// Inbound patient turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnRequest {
    pub session_id: String,
    pub message: String,
    /// Free-text context attached to any enrichment request.
    #[serde(default)]
    pub context: Option<String>,
    /// Request narrative enrichment once the assessment is final.
    #[serde(default)]
    pub enrich: bool,
}

impl TurnRequest {
    pub fn new(session_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            message: message.into(),
            context: None,
            enrich: false,
        }
    }

    pub fn with_enrichment(mut self) -> Self {
        self.enrich = true;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Reply to one patient turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: String,
    pub response_text: String,
    pub urgency_level: UrgencyLevel,
    pub stage: AssessmentStage,
    pub primary_symptom: Symptom,
    pub pending_questions: Vec<String>,
    pub red_flags: Vec<String>,
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentResult>,
}

/// Read-only overview of a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: Timestamp,
    pub primary_symptom: Symptom,
    pub stage: AssessmentStage,
    pub urgency_level: UrgencyLevel,
    pub collected: Vec<CollectedFact>,
    pub patient_turns: usize,
    pub message_count: usize,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.to_string(),
            created_at: session.created_at,
            primary_symptom: session.primary_symptom,
            stage: session.current_stage,
            urgency_level: session.current_urgency,
            collected: session.collected_facts(),
            patient_turns: session.patient_turns,
            message_count: session.messages.len(),
        }
    }
}
