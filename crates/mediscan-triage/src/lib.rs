//! Medical intake conversation engine.
//!
//! Identifies the primary symptom, tracks which facts the patient has
//! supplied, classifies urgency, and asks one prioritized follow-up question
//! per turn until a final disposition can be given.

pub mod composer;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod rules;
pub mod service;
pub mod store;
pub mod symptom;
pub mod tracker;
pub mod types;
pub mod urgency;

pub use composer::ResponseComposer;
pub use engine::AssessmentEngine;
pub use error::TriageError;
pub use rules::RuleBook;
pub use service::TriageService;
pub use store::{SessionStore, SessionTurn};
pub use symptom::SymptomIdentifier;
pub use tracker::InfoTracker;
pub use types::{
    AssessmentResult, CollectedFact, Message, PendingQuestion, Role, Session, SessionSummary,
    TurnReply, TurnRequest, Vitals,
};
pub use urgency::{RedFlagDetector, UrgencyClassifier};
