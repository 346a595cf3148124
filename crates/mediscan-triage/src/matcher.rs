//! Word-boundary phrase matching with a short negation guard.

/// Words looked back over when checking whether a phrase is negated.
const NEGATION_WINDOW: usize = 4;

/// Words that end the negation look-back ("no fever but chest pain").
const CLAUSE_BREAKS: &[&str] = &["but", "and", "though", "although", "except", "however"];

/// Lowercase text and fold typographic apostrophes.
pub fn normalize(text: &str) -> String {
    text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Whether the text carries any letters or digits at all.
pub fn has_content(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

/// Matches normalized phrases against normalized text.
#[derive(Debug, Clone, Default)]
pub struct PhraseMatcher {
    negations: Vec<String>,
}

impl PhraseMatcher {
    pub fn new(negations: &[String]) -> Self {
        Self {
            negations: negations.to_vec(),
        }
    }

    /// Byte offsets of every word-bounded occurrence of `phrase`.
    pub fn positions(text: &str, phrase: &str) -> Vec<usize> {
        if phrase.is_empty() {
            return Vec::new();
        }
        text.match_indices(phrase)
            .filter(|(start, _)| {
                let end = start + phrase.len();
                let before = text[..*start].chars().next_back();
                let after = text[end..].chars().next();
                !before.is_some_and(char::is_alphanumeric)
                    && !after.is_some_and(char::is_alphanumeric)
            })
            .map(|(start, _)| start)
            .collect()
    }

    /// Whether `phrase` occurs, negated or not.
    pub fn mentions(text: &str, phrase: &str) -> bool {
        !Self::positions(text, phrase).is_empty()
    }

    /// First phrase from `phrases` that occurs, negated or not.
    pub fn first_mentioned<'a>(text: &str, phrases: &'a [String]) -> Option<&'a str> {
        phrases
            .iter()
            .find(|p| Self::mentions(text, p))
            .map(String::as_str)
    }

    /// Whether `phrase` occurs at least once without a preceding negation.
    pub fn affirms(&self, text: &str, phrase: &str) -> bool {
        Self::positions(text, phrase)
            .into_iter()
            .any(|pos| !self.is_negated(text, pos))
    }

    pub fn affirms_any(&self, text: &str, phrases: &[String]) -> bool {
        phrases.iter().any(|p| self.affirms(text, p))
    }

    fn is_negated(&self, text: &str, pos: usize) -> bool {
        let prefix = &text[..pos];
        let clause_start = prefix
            .rfind(|c: char| matches!(c, '.' | ',' | ';' | '!' | '?' | '\n'))
            .map(|i| i + 1)
            .unwrap_or(0);

        for word in prefix[clause_start..]
            .split_whitespace()
            .rev()
            .take(NEGATION_WINDOW)
        {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
            if CLAUSE_BREAKS.contains(&word) {
                return false;
            }
            if self.negations.iter().any(|n| n == word) {
                return true;
            }
        }
        false
    }
}
