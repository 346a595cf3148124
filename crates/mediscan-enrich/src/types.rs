//! Request and result types for enrichment.

use mediscan_core::{RiskLevel, Timestamp};
use serde::{Deserialize, Serialize};

/// Which kind of clinical result is being enriched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    #[default]
    Skin,
    Radiology,
    Triage,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skin => "skin",
            Self::Radiology => "radiology",
            Self::Triage => "triage",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skin" => Some(Self::Skin),
            "radiology" | "xray" | "x-ray" => Some(Self::Radiology),
            "triage" => Some(Self::Triage),
            _ => None,
        }
    }
}

/// Input to [`crate::EnrichmentOrchestrator::enrich`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    /// Condition label or primary symptom, e.g. "melanoma" or "chest pain".
    pub subject: String,
    /// Classifier confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    pub risk: RiskLevel,
    #[serde(default)]
    pub kind: AnalysisKind,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub extra_context: Option<String>,
}

impl EnrichmentRequest {
    pub fn new(subject: impl Into<String>, confidence: f32, risk: RiskLevel) -> Self {
        Self {
            subject: subject.into(),
            confidence: confidence.clamp(0.0, 1.0),
            risk,
            kind: AnalysisKind::default(),
            recommendations: Vec::new(),
            extra_context: None,
        }
    }

    pub fn with_kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.extra_context = Some(context.into());
        self
    }

    /// Subject trimmed, or a generic label when blank.
    pub fn subject_label(&self) -> &str {
        let trimmed = self.subject.trim();
        if trimmed.is_empty() {
            "the reported condition"
        } else {
            trimmed
        }
    }
}

/// Narrative summary slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub text: String,
    pub explanation: String,
    pub confidence_note: String,
    pub risk_note: String,
}

/// A reference link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub url: String,
    pub source: String,
    pub snippet: String,
}

/// Extracted keywords by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keywords {
    pub conditions: Vec<String>,
    pub symptoms: Vec<String>,
    pub treatments: Vec<String>,
    pub procedures: Vec<String>,
    pub general: Vec<String>,
}

impl Keywords {
    /// True when every category is empty.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
            && self.symptoms.is_empty()
            && self.treatments.is_empty()
            && self.procedures.is_empty()
            && self.general.is_empty()
    }

    /// Total number of keywords across categories.
    pub fn len(&self) -> usize {
        self.conditions.len()
            + self.symptoms.len()
            + self.treatments.len()
            + self.procedures.len()
            + self.general.len()
    }

    /// Cap every category at `max` entries.
    pub fn truncate(&mut self, max: usize) {
        for category in [
            &mut self.conditions,
            &mut self.symptoms,
            &mut self.treatments,
            &mut self.procedures,
            &mut self.general,
        ] {
            category.truncate(max);
        }
    }
}

/// Where a slot's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    Provider,
    Fallback,
}

/// Per-slot data-source metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub summary: SlotSource,
    pub resources: SlotSource,
    pub keywords: SlotSource,
}

impl DataSources {
    pub fn status(&self) -> EnrichmentStatus {
        let slots = [self.summary, self.resources, self.keywords];
        let from_provider = slots
            .iter()
            .filter(|s| **s == SlotSource::Provider)
            .count();
        match from_provider {
            3 => EnrichmentStatus::Complete,
            0 => EnrichmentStatus::Fallback,
            _ => EnrichmentStatus::Partial,
        }
    }
}

/// Overall enrichment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Every slot came from its provider.
    Complete,
    /// Some slots were filled by fallbacks.
    Partial,
    /// Every slot was filled by fallbacks.
    Fallback,
}

/// Enrichment output. Always populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub summary: Summary,
    pub resources: Vec<Resource>,
    pub keywords: Keywords,
    pub sources: DataSources,
    pub status: EnrichmentStatus,
    pub generated_at: Timestamp,
}
