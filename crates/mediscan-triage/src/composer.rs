//! Response composition for intake turns.
//!
//! Renders an [`AssessmentResult`] as patient-facing text without an LLM.
//! Mid-conversation replies are an acknowledgement plus at most one
//! question; the final reply is the full disposition.

use std::fmt::Write as _;
use std::sync::Arc;

use mediscan_core::{Symptom, UrgencyLevel};

use crate::rules::RuleBook;
use crate::types::AssessmentResult;

pub struct ResponseComposer {
    rules: Arc<RuleBook>,
}

impl ResponseComposer {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self { rules }
    }

    pub fn compose(&self, result: &AssessmentResult) -> String {
        if result.stage.is_final() {
            self.disposition(result)
        } else {
            self.follow_up(result)
        }
    }

    fn acknowledgement(&self, result: &AssessmentResult) -> &str {
        let messages = &self.rules.messages;
        if result.low_information {
            return &messages.didnt_catch;
        }
        if result.first_turn {
            return &self.rules.protocol(result.primary_symptom).opening;
        }
        result
            .newly_collected
            .first()
            .and_then(|fact| self.rules.fact_ack(*fact))
            .unwrap_or(messages.generic_ack.as_str())
    }

    fn follow_up(&self, result: &AssessmentResult) -> String {
        let mut text = self.acknowledgement(result).to_string();
        if result.urgency_level == UrgencyLevel::Emergency {
            text.push(' ');
            text.push_str(&self.rules.messages.emergency_advisory);
        }
        if let Some(question) = result.pending_questions.first() {
            text.push_str("\n\n");
            text.push_str(&question.text);
        }
        text
    }

    fn disposition(&self, result: &AssessmentResult) -> String {
        let level = result.urgency_level;
        let mut text = String::from(self.rules.banner(level));

        text.push_str("\n\n**Summary of what you've told me:**\n");
        if result.primary_symptom != Symptom::General {
            let _ = writeln!(
                text,
                "• Main concern: {}",
                result.primary_symptom.display_name()
            );
        }
        for collected in &result.collected {
            let _ = writeln!(
                text,
                "• {}: {}",
                collected.fact.label(),
                collected.detail.as_deref().unwrap_or("noted")
            );
        }

        if !result.red_flags.is_empty() {
            text.push_str("\n**⚠️ Warning signs:**\n");
            for flag in &result.red_flags {
                let _ = writeln!(text, "• {}", flag);
            }
        }

        text.push_str("\n**Recommended next steps:**\n");
        for (i, step) in result.next_steps.iter().enumerate() {
            let _ = writeln!(text, "{}. {}", i + 1, step);
        }

        text.push('\n');
        text.push_str(self.rules.closing(level));
        text
    }
}
