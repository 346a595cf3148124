//! Urgency classification and red-flag detection.

use mediscan_core::config::TriageConfig;
use mediscan_core::UrgencyLevel;

use crate::matcher::PhraseMatcher;
use crate::rules::{PhraseRule, RuleBook};
use crate::types::Vitals;

/// Whether `rule` matches any of `texts`.
///
/// Plain phrases must match within one text; each `all_of` group may be
/// satisfied by a different text.
pub fn rule_matches<S: AsRef<str>>(matcher: &PhraseMatcher, rule: &PhraseRule, texts: &[S]) -> bool {
    let phrase_hit = texts
        .iter()
        .any(|t| matcher.affirms_any(t.as_ref(), &rule.phrases));
    if phrase_hit {
        return true;
    }
    !rule.all_of.is_empty()
        && rule
            .all_of
            .iter()
            .all(|group| texts.iter().any(|t| matcher.affirms_any(t.as_ref(), group)))
}

/// Level plus the rule or reading that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct UrgencyAssessment {
    pub level: UrgencyLevel,
    pub reason: Option<String>,
}

// =============================================================================
// UrgencyClassifier
// =============================================================================

/// Emergency rules first, then urgent rules, otherwise routine.
pub struct UrgencyClassifier<'a> {
    rules: &'a RuleBook,
    matcher: &'a PhraseMatcher,
    config: &'a TriageConfig,
}

impl<'a> UrgencyClassifier<'a> {
    pub fn new(rules: &'a RuleBook, matcher: &'a PhraseMatcher, config: &'a TriageConfig) -> Self {
        Self {
            rules,
            matcher,
            config,
        }
    }

    /// Classify normalized `texts` together with peak `vitals`.
    pub fn classify<S: AsRef<str>>(&self, texts: &[S], vitals: Vitals) -> UrgencyAssessment {
        let temperature = vitals.temperature_f;

        if let Some(t) = temperature.filter(|t| *t >= self.config.emergency_temperature_f) {
            return UrgencyAssessment {
                level: UrgencyLevel::Emergency,
                reason: Some(format!("temperature {:.1}°F", t)),
            };
        }
        if let Some(rule) = self
            .rules
            .urgency
            .emergency
            .iter()
            .find(|r| rule_matches(self.matcher, r, texts))
        {
            return UrgencyAssessment {
                level: UrgencyLevel::Emergency,
                reason: Some(rule.label.clone()),
            };
        }

        if let Some(t) = temperature.filter(|t| *t >= self.config.urgent_temperature_f) {
            return UrgencyAssessment {
                level: UrgencyLevel::Urgent,
                reason: Some(format!("temperature {:.1}°F", t)),
            };
        }
        if let Some(s) = vitals
            .severity
            .filter(|s| *s >= self.config.urgent_severity)
        {
            return UrgencyAssessment {
                level: UrgencyLevel::Urgent,
                reason: Some(format!("severity {}/10", s)),
            };
        }
        if let Some(rule) = self
            .rules
            .urgency
            .urgent
            .iter()
            .find(|r| rule_matches(self.matcher, r, texts))
        {
            return UrgencyAssessment {
                level: UrgencyLevel::Urgent,
                reason: Some(rule.label.clone()),
            };
        }

        UrgencyAssessment {
            level: UrgencyLevel::Routine,
            reason: None,
        }
    }

    /// Whether the message reports that symptoms have resolved. Negated
    /// markers ("i don't feel better") do not count.
    pub fn is_de_escalation(&self, text: &str) -> bool {
        self.matcher
            .affirms_any(text, &self.rules.urgency.de_escalation)
    }
}

// =============================================================================
// RedFlagDetector
// =============================================================================

/// Collects warning labels over the whole conversation. Additive: a flag
/// stays once any message has raised it.
pub struct RedFlagDetector<'a> {
    rules: &'a RuleBook,
    matcher: &'a PhraseMatcher,
    config: &'a TriageConfig,
}

impl<'a> RedFlagDetector<'a> {
    pub fn new(rules: &'a RuleBook, matcher: &'a PhraseMatcher, config: &'a TriageConfig) -> Self {
        Self {
            rules,
            matcher,
            config,
        }
    }

    pub fn detect<S: AsRef<str>>(&self, texts: &[S], vitals: Vitals) -> Vec<String> {
        let mut flags: Vec<String> = self
            .rules
            .red_flags
            .iter()
            .filter(|r| rule_matches(self.matcher, r, texts))
            .map(|r| r.label.clone())
            .collect();
        if vitals
            .temperature_f
            .is_some_and(|t| t >= self.config.high_fever_flag_f)
        {
            flags.push(self.rules.messages.high_fever_flag.clone());
        }
        flags
    }
}
