//! Primary-symptom identification.

use mediscan_core::Symptom;

use crate::matcher::PhraseMatcher;
use crate::rules::RuleBook;

/// Maps free text to a canonical primary-symptom tag.
///
/// The current message is searched first, then prior patient messages from
/// most recent to oldest. Within a message the rule book's priority order
/// decides, so "fever and a headache" resolves to fever.
pub struct SymptomIdentifier<'a> {
    rules: &'a RuleBook,
    matcher: &'a PhraseMatcher,
}

impl<'a> SymptomIdentifier<'a> {
    pub fn new(rules: &'a RuleBook, matcher: &'a PhraseMatcher) -> Self {
        Self { rules, matcher }
    }

    /// `current` and `history` must already be normalized. `history` is
    /// ordered most recent first.
    pub fn identify<S: AsRef<str>>(&self, current: &str, history: &[S]) -> Symptom {
        std::iter::once(current)
            .chain(history.iter().map(|h| h.as_ref()))
            .find_map(|text| self.in_text(text))
            .unwrap_or(Symptom::General)
    }

    /// First symptom, by priority, affirmed in a single text.
    pub fn in_text(&self, text: &str) -> Option<Symptom> {
        self.rules
            .symptoms
            .iter()
            .filter(|rule| rule.tag != Symptom::General)
            .find(|rule| self.matcher.affirms_any(text, &rule.keywords))
            .map(|rule| rule.tag)
    }
}
