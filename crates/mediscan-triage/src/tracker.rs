//! Fact inference from patient messages.
//!
//! A fact counts as answered when the message mentions it, states a
//! recognizable value for it, or replies yes/no/unsure directly after the
//! question that asked for it.

use std::sync::LazyLock;

use mediscan_core::Fact;
use regex::Regex;

use crate::matcher::{self, PhraseMatcher};
use crate::rules::{FactRule, RuleBook};
use crate::types::{CollectedFact, PendingQuestion, Vitals};

// =============================================================================
// Compiled patterns
// =============================================================================

static TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{2,3}(?:\.\d+)?)\s*(?:°|degrees?|deg)?\s*(fahrenheit|celsius|f|c)?\b(?:\s*([a-z]+))?",
    )
    .expect("Invalid temperature regex")
});

static SEVERITY_SCALE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(10|[0-9])\s*(?:/|out\s+of)\s*10\b").expect("Invalid severity regex")
});

static BARE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(10|[0-9])\b(?:\s*([a-z]+))?").expect("Invalid number regex")
});

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:\d+|a|an|one|two|three|four|five|six|seven|eight|nine|ten|a few|a couple of|a couple|several)\s+(?:minutes?|mins?|hours?|hrs?|days?|weeks?|months?|years?)\b",
    )
    .expect("Invalid duration regex")
});

/// Any of these in the message makes a bare number a temperature candidate.
const TEMPERATURE_CONTEXT: &[&str] = &[
    "fever",
    "temp",
    "temperature",
    "degrees",
    "°",
    "thermometer",
    "reading",
    "febrile",
];

/// A number followed by one of these is a quantity, not a temperature or a
/// severity rating.
const QUANTITY_UNITS: &[&str] = &[
    "year", "years", "yrs", "yr", "old", "hour", "hours", "hrs", "day", "days", "minute",
    "minutes", "mins", "week", "weeks", "month", "months", "lbs", "pounds", "kg", "mg", "percent",
    "bpm", "times", "am", "pm", "pills", "tablets",
];

const MAX_DETAIL_CHARS: usize = 60;

// =============================================================================
// Extraction helpers
// =============================================================================

fn celsius_to_fahrenheit(c: f32) -> f32 {
    c * 9.0 / 5.0 + 32.0
}

/// Highest plausible body temperature in the text, in Fahrenheit.
///
/// Without a unit, 35-43 is read as Celsius and 95-110 as Fahrenheit.
/// Numbers are only considered when the text talks about temperature or the
/// patient was just asked for a reading.
pub fn temperature_f(text: &str, expecting: bool) -> Option<f32> {
    if !expecting && !TEMPERATURE_CONTEXT.iter().any(|w| text.contains(w)) {
        return None;
    }

    let mut best: Option<f32> = None;
    for caps in TEMPERATURE.captures_iter(text) {
        let Ok(value) = caps[1].parse::<f32>() else {
            continue;
        };
        let next = caps.get(3).map(|m| m.as_str()).unwrap_or("");
        if QUANTITY_UNITS.contains(&next) {
            continue;
        }
        let fahrenheit = match caps.get(2).map(|m| m.as_str()) {
            Some("c") | Some("celsius") => celsius_to_fahrenheit(value),
            Some(_) => value,
            None if (35.0..=43.0).contains(&value) => celsius_to_fahrenheit(value),
            None => value,
        };
        if (95.0..=110.0).contains(&fahrenheit) {
            best = Some(best.map_or(fahrenheit, |b: f32| b.max(fahrenheit)));
        }
    }
    best
}

/// Severity out of 10, from "7/10", "7 out of 10", or a bare number given in
/// reply to a severity question. Descriptive words such as "mild" do not count,
/// and neither do quantities like "2 days".
pub fn severity(text: &str, expecting: bool) -> Option<u8> {
    if let Some(caps) = SEVERITY_SCALE.captures(text) {
        return caps[1].parse().ok();
    }
    if !expecting {
        return None;
    }
    BARE_NUMBER
        .captures_iter(text)
        .find(|caps| {
            let next = caps.get(2).map_or("", |m| m.as_str());
            !QUANTITY_UNITS.contains(&next)
        })
        .and_then(|caps| caps[1].parse().ok())
}

/// A duration phrase such as "3 days" or "a couple of weeks".
pub fn duration(text: &str) -> Option<String> {
    DURATION
        .find_iter(text)
        .find(|m| !text[m.end()..].trim_start().starts_with("old"))
        .map(|m| m.as_str().to_string())
}

/// First keyword of each fact rule found in `text`.
///
/// A keyword occurrence lying inside a longer keyword of another rule is
/// skipped, so "high blood pressure" answers medical history without also
/// matching "blood" or "pressure".
fn keyword_hits<'r>(text: &str, rules: &'r [FactRule]) -> Vec<(Fact, &'r str)> {
    let spans: Vec<(usize, usize, usize)> = rules
        .iter()
        .enumerate()
        .flat_map(|(idx, rule)| {
            rule.keywords.iter().flat_map(move |kw| {
                PhraseMatcher::positions(text, kw)
                    .into_iter()
                    .map(move |start| (idx, start, start + kw.len()))
            })
        })
        .collect();

    let shadowed = |idx: usize, start: usize, end: usize| {
        spans.iter().any(|&(other, s, e)| {
            other != idx && s <= start && e >= end && e - s > end - start
        })
    };

    rules
        .iter()
        .enumerate()
        .filter_map(|(idx, rule)| {
            rule.keywords
                .iter()
                .find(|kw| {
                    PhraseMatcher::positions(text, kw)
                        .into_iter()
                        .any(|start| !shadowed(idx, start, start + kw.len()))
                })
                .map(|kw| (rule.fact, kw.as_str()))
        })
        .collect()
}

fn detail(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_DETAIL_CHARS {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_DETAIL_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

// =============================================================================
// InfoTracker
// =============================================================================

/// Facts and readings inferred from one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inference {
    pub facts: Vec<CollectedFact>,
    pub vitals: Vitals,
}

impl Inference {
    fn add(&mut self, fact: Fact, detail: Option<String>) {
        if !self.facts.iter().any(|f| f.fact == fact) {
            self.facts.push(CollectedFact { fact, detail });
        }
    }

    pub fn contains(&self, fact: Fact) -> bool {
        self.facts.iter().any(|f| f.fact == fact)
    }
}

/// Infers which facts a patient message answers.
pub struct InfoTracker<'a> {
    rules: &'a RuleBook,
}

impl<'a> InfoTracker<'a> {
    pub fn new(rules: &'a RuleBook) -> Self {
        Self { rules }
    }

    /// Infer facts from normalized `text`.
    ///
    /// `pending` is the question the patient is replying to, and
    /// `times_asked` how often it has been asked so far. A question that has
    /// already been re-asked accepts any reply with content.
    pub fn infer(
        &self,
        text: &str,
        pending: Option<&PendingQuestion>,
        times_asked: usize,
    ) -> Inference {
        let expecting = pending.and_then(|q| q.fact);
        let mut inference = Inference::default();

        if let Some(t) = temperature_f(text, expecting == Some(Fact::Temperature)) {
            inference.vitals.temperature_f = Some(t);
            inference.add(Fact::Temperature, Some(format!("{:.1}°F", t)));
        }
        if let Some(s) = severity(text, expecting == Some(Fact::Severity)) {
            inference.vitals.severity = Some(s);
            inference.add(Fact::Severity, Some(format!("{}/10", s)));
        }
        if let Some(d) = duration(text) {
            inference.add(Fact::Duration, Some(d));
        }

        for (fact, phrase) in keyword_hits(text, &self.rules.facts) {
            inference.add(fact, Some(phrase.to_string()));
        }

        if let Some(fact) = expecting {
            if self.is_direct_answer(text) || (times_asked >= 2 && matcher::has_content(text)) {
                inference.add(fact, Some(detail(text)));
            }
        }

        inference
    }

    /// Whether the message opens with a yes/no/unsure style reply.
    pub fn is_direct_answer(&self, text: &str) -> bool {
        let text = text.trim_start();
        self.rules.answers.terms.iter().any(|term| {
            text.starts_with(term.as_str())
                && !text[term.len()..]
                    .chars()
                    .next()
                    .is_some_and(char::is_alphanumeric)
        })
    }
}
