//! In-memory session store.
//!
//! Sessions live in a map behind a short-lived `std::sync::Mutex`; each
//! session has its own `tokio::sync::Mutex`. A turn holds that session
//! mutex for its whole read-assess-write cycle, so turns on one session
//! apply in arrival order while different sessions proceed in parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use mediscan_core::{AssessmentStage, Fact, SessionId, Symptom, UrgencyLevel};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::TriageError;
use crate::types::{Message, Role, Session, Vitals};

type SessionCell = Arc<AsyncMutex<Session>>;

/// Owns every session's state. Created empty; sessions appear on first use.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionCell>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, id: &SessionId, create: bool) -> Result<Option<SessionCell>, TriageError> {
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| TriageError::Store(format!("session map lock poisoned: {}", e)))?;
        if let Some(cell) = sessions.get(id) {
            return Ok(Some(Arc::clone(cell)));
        }
        if !create {
            return Ok(None);
        }
        tracing::debug!(session_id = %id, "Creating session");
        let cell = Arc::new(AsyncMutex::new(Session::new(id.clone())));
        sessions.insert(id.clone(), Arc::clone(&cell));
        Ok(Some(cell))
    }

    fn existing(&self, id: &SessionId) -> Result<SessionCell, TriageError> {
        self.cell(id, false)?
            .ok_or_else(|| TriageError::UnknownSession(id.to_string()))
    }

    fn get_or_create(&self, id: &SessionId) -> Result<SessionCell, TriageError> {
        self.cell(id, true)?
            .ok_or_else(|| TriageError::Store(format!("session {} could not be created", id)))
    }

    /// Return a snapshot of the session, creating it if absent.
    pub async fn create_or_get(&self, id: &SessionId) -> Result<Session, TriageError> {
        let cell = self.get_or_create(id)?;
        let session = cell.lock().await;
        Ok(session.clone())
    }

    /// Snapshot of an existing session.
    pub async fn snapshot(&self, id: &SessionId) -> Result<Session, TriageError> {
        let cell = self.existing(id)?;
        let session = cell.lock().await;
        Ok(session.clone())
    }

    pub async fn append_message(&self, id: &SessionId, message: Message) -> Result<(), TriageError> {
        let mut turn = self.begin_turn(id).await?;
        turn.append_message(message);
        Ok(())
    }

    /// The last `n` messages of an existing session, oldest first.
    pub async fn recent_history(
        &self,
        id: &SessionId,
        n: usize,
    ) -> Result<Vec<Message>, TriageError> {
        let cell = self.existing(id)?;
        let session = cell.lock().await;
        let start = session.messages.len().saturating_sub(n);
        Ok(session.messages[start..].to_vec())
    }

    pub async fn get_flag(&self, id: &SessionId, fact: Fact) -> Result<bool, TriageError> {
        let cell = self.existing(id)?;
        let session = cell.lock().await;
        Ok(session.collected.contains(&fact))
    }

    /// Mark `fact` collected. Returns whether it was newly collected.
    pub async fn set_flag(&self, id: &SessionId, fact: Fact) -> Result<bool, TriageError> {
        let mut turn = self.begin_turn(id).await?;
        Ok(turn.set_flag(fact, None))
    }

    /// Apply an urgency level and return the session's resulting level.
    pub async fn set_urgency(
        &self,
        id: &SessionId,
        level: UrgencyLevel,
        de_escalation: bool,
    ) -> Result<UrgencyLevel, TriageError> {
        let mut turn = self.begin_turn(id).await?;
        Ok(turn.set_urgency(level, de_escalation))
    }

    /// Acquire exclusive access to a session for one turn, creating it if
    /// absent. Waiters are served in arrival order.
    pub async fn begin_turn(&self, id: &SessionId) -> Result<SessionTurn, TriageError> {
        let cell = self.get_or_create(id)?;
        Ok(SessionTurn {
            guard: cell.lock_owned().await,
        })
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }
}

// =============================================================================
// SessionTurn
// =============================================================================

/// Exclusive handle on one session for the duration of a turn.
///
/// All writes go through these methods, which enforce the session
/// invariants: facts are only ever added, stage only moves forward, and
/// urgency only rises unless explicitly de-escalated.
pub struct SessionTurn {
    guard: OwnedMutexGuard<Session>,
}

impl SessionTurn {
    pub fn session(&self) -> &Session {
        &self.guard
    }

    pub fn append_message(&mut self, message: Message) {
        if message.role == Role::Patient {
            self.guard.patient_turns += 1;
        }
        self.guard.messages.push(message);
    }

    pub fn recent_history(&self, n: usize) -> &[Message] {
        let start = self.guard.messages.len().saturating_sub(n);
        &self.guard.messages[start..]
    }

    /// Up to `n` patient messages before the latest one, most recent first.
    pub fn prior_patient_texts(&self, n: usize) -> Vec<&str> {
        self.guard
            .patient_messages()
            .rev()
            .skip(1)
            .take(n)
            .map(|m| m.text.as_str())
            .collect()
    }

    /// Every patient message, oldest first.
    pub fn patient_texts(&self) -> Vec<&str> {
        self.guard
            .patient_messages()
            .map(|m| m.text.as_str())
            .collect()
    }

    /// Patient messages that still count toward urgency, oldest first.
    pub fn urgency_texts(&self) -> Vec<&str> {
        self.urgency_window()
            .map(|m| m.text.as_str())
            .collect()
    }

    /// Peak readings over the messages that still count toward urgency.
    pub fn urgency_vitals(&self) -> Vitals {
        self.urgency_window()
            .fold(Vitals::default(), |acc, m| acc.max(m.vitals))
    }

    /// Peak readings over the whole session.
    pub fn peak_vitals(&self) -> Vitals {
        self.guard
            .patient_messages()
            .fold(Vitals::default(), |acc, m| acc.max(m.vitals))
    }

    fn urgency_window(&self) -> impl Iterator<Item = &Message> {
        self.guard.messages[self.guard.urgency_from.min(self.guard.messages.len())..]
            .iter()
            .filter(|m| m.role == Role::Patient)
    }

    /// Attach readings to the latest patient message.
    pub fn record_vitals(&mut self, vitals: Vitals) {
        if let Some(message) = self
            .guard
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.role == Role::Patient)
        {
            message.vitals = vitals;
        }
    }

    pub fn set_primary_symptom(&mut self, symptom: Symptom) {
        self.guard.primary_symptom = symptom;
    }

    pub fn get_flag(&self, fact: Fact) -> bool {
        self.guard.collected.contains(&fact)
    }

    /// Mark `fact` collected, keeping the first detail recorded for it.
    /// Returns whether the fact was newly collected.
    pub fn set_flag(&mut self, fact: Fact, detail: Option<String>) -> bool {
        let newly = self.guard.collected.insert(fact);
        if let Some(detail) = detail {
            self.guard.fact_details.entry(fact).or_insert(detail);
        }
        newly
    }

    /// Raise urgency to `level`, or replace it when `de_escalation` is set.
    ///
    /// A de-escalation also restarts the urgency window at the latest
    /// message, so earlier messages no longer raise it again.
    pub fn set_urgency(&mut self, level: UrgencyLevel, de_escalation: bool) -> UrgencyLevel {
        let current = self.guard.current_urgency;
        if de_escalation {
            if level < current {
                tracing::info!(
                    session_id = %self.guard.id,
                    from = %current,
                    to = %level,
                    "Urgency lowered after reported resolution"
                );
            }
            self.guard.current_urgency = level;
            self.guard.urgency_from = self
                .guard
                .messages
                .iter()
                .rposition(|m| m.role == Role::Patient)
                .unwrap_or(0);
        } else {
            self.guard.current_urgency = current.max(level);
        }
        self.guard.current_urgency
    }

    /// Advance the stage. Earlier stages are ignored.
    pub fn set_stage(&mut self, stage: AssessmentStage) -> AssessmentStage {
        self.guard.current_stage = self.guard.current_stage.max(stage);
        self.guard.current_stage
    }
}
