//! Declarative intake rule book.
//!
//! Symptom question tables, fact inference phrases, urgency rules, red flags,
//! and disposition text are data, loaded from TOML. The built-in rule book is
//! compiled into the binary; a file on disk may replace it.

use std::path::Path;

use mediscan_core::{Fact, Symptom, UrgencyLevel};
use serde::Deserialize;

use crate::error::TriageError;

const BUILTIN_RULES: &str = include_str!("../rules/intake.toml");

/// One prioritized question for a primary symptom.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRule {
    pub fact: Fact,
    pub text: String,
}

/// Question table for one primary symptom.
#[derive(Debug, Clone, Deserialize)]
pub struct SymptomRule {
    pub tag: Symptom,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub opening: String,
    pub questions: Vec<QuestionRule>,
}

/// Phrases that mark a fact as collected.
#[derive(Debug, Clone, Deserialize)]
pub struct FactRule {
    pub fact: Fact,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub ack: String,
}

/// Matches when any phrase matches, or when every `all_of` group matches.
#[derive(Debug, Clone, Deserialize)]
pub struct PhraseRule {
    pub label: String,
    #[serde(default)]
    pub phrases: Vec<String>,
    #[serde(default)]
    pub all_of: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerRules {
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UrgencyRules {
    pub negations: Vec<String>,
    pub de_escalation: Vec<String>,
    pub emergency: Vec<PhraseRule>,
    pub urgent: Vec<PhraseRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NextSteps {
    pub emergency: Vec<String>,
    pub urgent: Vec<String>,
    pub routine: Vec<String>,
}

/// Fixed response fragments.
#[derive(Debug, Clone, Deserialize)]
pub struct Messages {
    pub clarifying_question: String,
    pub didnt_catch: String,
    pub generic_ack: String,
    pub emergency_advisory: String,
    pub high_fever_flag: String,
    pub emergency_banner: String,
    pub urgent_banner: String,
    pub routine_banner: String,
    pub emergency_closing: String,
    pub urgent_closing: String,
    pub routine_closing: String,
}

/// The complete intake rule book.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleBook {
    pub symptoms: Vec<SymptomRule>,
    pub facts: Vec<FactRule>,
    pub answers: AnswerRules,
    pub urgency: UrgencyRules,
    pub red_flags: Vec<PhraseRule>,
    pub next_steps: NextSteps,
    pub messages: Messages,
}

impl RuleBook {
    /// The rule book shipped with the crate.
    pub fn builtin() -> Result<Self, TriageError> {
        Self::parse(BUILTIN_RULES)
    }

    /// Parse and validate a rule book from TOML text.
    pub fn parse(text: &str) -> Result<Self, TriageError> {
        let mut book: RuleBook = toml::from_str(text)?;
        book.normalize();
        book.validate()?;
        Ok(book)
    }

    /// Load a rule book from disk.
    pub fn load(path: &Path) -> Result<Self, TriageError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TriageError::Rules(format!("{}: {}", path.display(), e)))?;
        Self::parse(&text)
    }

    /// Load from `path` when given, otherwise use the built-in rule book.
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self, TriageError> {
        match path {
            Some(p) => {
                tracing::info!(path = p, "Loading intake rule book");
                Self::load(Path::new(p))
            }
            None => Self::builtin(),
        }
    }

    /// Question table for `symptom`, falling back to the general table.
    pub fn protocol(&self, symptom: Symptom) -> &SymptomRule {
        self.symptoms
            .iter()
            .find(|s| s.tag == symptom)
            .unwrap_or_else(|| self.general())
    }

    /// The general-protocol table. Presence is checked by `validate`.
    pub fn general(&self) -> &SymptomRule {
        let last = self.symptoms.len() - 1;
        &self.symptoms[last]
    }

    pub fn fact_ack(&self, fact: Fact) -> Option<&str> {
        self.facts
            .iter()
            .find(|f| f.fact == fact)
            .map(|f| f.ack.as_str())
    }

    pub fn next_steps(&self, level: UrgencyLevel) -> &[String] {
        match level {
            UrgencyLevel::Emergency => &self.next_steps.emergency,
            UrgencyLevel::Urgent => &self.next_steps.urgent,
            UrgencyLevel::Routine => &self.next_steps.routine,
        }
    }

    pub fn banner(&self, level: UrgencyLevel) -> &str {
        match level {
            UrgencyLevel::Emergency => &self.messages.emergency_banner,
            UrgencyLevel::Urgent => &self.messages.urgent_banner,
            UrgencyLevel::Routine => &self.messages.routine_banner,
        }
    }

    pub fn closing(&self, level: UrgencyLevel) -> &str {
        match level {
            UrgencyLevel::Emergency => &self.messages.emergency_closing,
            UrgencyLevel::Urgent => &self.messages.urgent_closing,
            UrgencyLevel::Routine => &self.messages.routine_closing,
        }
    }

    fn normalize(&mut self) {
        fn lower(list: &mut [String]) {
            for phrase in list.iter_mut() {
                *phrase = crate::matcher::normalize(phrase.trim());
            }
        }
        fn lower_rule(rule: &mut PhraseRule) {
            lower(&mut rule.phrases);
            for group in rule.all_of.iter_mut() {
                lower(group);
            }
        }

        for symptom in self.symptoms.iter_mut() {
            lower(&mut symptom.keywords);
        }
        for fact in self.facts.iter_mut() {
            lower(&mut fact.keywords);
        }
        lower(&mut self.answers.terms);
        lower(&mut self.urgency.negations);
        lower(&mut self.urgency.de_escalation);
        self.urgency.emergency.iter_mut().for_each(lower_rule);
        self.urgency.urgent.iter_mut().for_each(lower_rule);
        self.red_flags.iter_mut().for_each(lower_rule);
    }

    fn validate(&self) -> Result<(), TriageError> {
        let Some(last) = self.symptoms.last() else {
            return Err(TriageError::Rules("no symptom tables defined".to_string()));
        };
        if last.tag != Symptom::General {
            return Err(TriageError::Rules(
                "the last symptom table must be `general`".to_string(),
            ));
        }
        for (i, symptom) in self.symptoms.iter().enumerate() {
            if self.symptoms[..i].iter().any(|s| s.tag == symptom.tag) {
                return Err(TriageError::Rules(format!(
                    "duplicate symptom table: {}",
                    symptom.tag
                )));
            }
            if symptom.questions.is_empty() {
                return Err(TriageError::Rules(format!(
                    "symptom {} has no questions",
                    symptom.tag
                )));
            }
            if symptom.tag != Symptom::General && symptom.keywords.is_empty() {
                return Err(TriageError::Rules(format!(
                    "symptom {} has no keywords",
                    symptom.tag
                )));
            }
            if let Some(q) = symptom.questions.iter().find(|q| q.text.trim().is_empty()) {
                return Err(TriageError::Rules(format!(
                    "symptom {} has an empty question for {}",
                    symptom.tag, q.fact
                )));
            }
        }
        let rules = self
            .urgency
            .emergency
            .iter()
            .chain(&self.urgency.urgent)
            .chain(&self.red_flags);
        for rule in rules {
            if rule.phrases.is_empty() && rule.all_of.is_empty() {
                return Err(TriageError::Rules(format!(
                    "rule \"{}\" has no phrases",
                    rule.label
                )));
            }
            if rule.all_of.iter().any(Vec::is_empty) {
                return Err(TriageError::Rules(format!(
                    "rule \"{}\" has an empty all_of group",
                    rule.label
                )));
            }
        }
        Ok(())
    }
}
