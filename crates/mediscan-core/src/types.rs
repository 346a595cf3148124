use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MediscanError, Result};

// =============================================================================
// Urgency and risk
// =============================================================================

/// Triage urgency. Ordered so that `Routine < Urgent < Emergency`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Routine,
    Urgent,
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Routine => "routine",
            UrgencyLevel::Urgent => "urgent",
            UrgencyLevel::Emergency => "emergency",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UrgencyLevel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "routine" => Ok(UrgencyLevel::Routine),
            "urgent" => Ok(UrgencyLevel::Urgent),
            "emergency" => Ok(UrgencyLevel::Emergency),
            _ => Err(format!("Unknown urgency level: {}", s)),
        }
    }
}

/// Risk classification attached to a clinical result (classifier or triage).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "moderate" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(format!("Unknown risk level: {}", s)),
        }
    }
}

impl From<UrgencyLevel> for RiskLevel {
    fn from(level: UrgencyLevel) -> Self {
        match level {
            UrgencyLevel::Routine => RiskLevel::Low,
            UrgencyLevel::Urgent => RiskLevel::High,
            UrgencyLevel::Emergency => RiskLevel::Critical,
        }
    }
}

// =============================================================================
// Intake state machine
// =============================================================================

/// Position in the linear intake state machine.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStage {
    #[default]
    InitialPresentation,
    SymptomCharacterization,
    AssociatedSymptoms,
    MedicalHistory,
    FinalAssessment,
}

impl AssessmentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStage::InitialPresentation => "initial_presentation",
            AssessmentStage::SymptomCharacterization => "symptom_characterization",
            AssessmentStage::AssociatedSymptoms => "associated_symptoms",
            AssessmentStage::MedicalHistory => "medical_history",
            AssessmentStage::FinalAssessment => "final_assessment",
        }
    }

    /// The stage immediately after this one. `FinalAssessment` is terminal.
    pub fn next(&self) -> Self {
        match self {
            AssessmentStage::InitialPresentation => AssessmentStage::SymptomCharacterization,
            AssessmentStage::SymptomCharacterization => AssessmentStage::AssociatedSymptoms,
            AssessmentStage::AssociatedSymptoms => AssessmentStage::MedicalHistory,
            AssessmentStage::MedicalHistory | AssessmentStage::FinalAssessment => {
                AssessmentStage::FinalAssessment
            }
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, AssessmentStage::FinalAssessment)
    }
}

impl fmt::Display for AssessmentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical primary-symptom tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    Fever,
    ChestPain,
    ShortnessOfBreath,
    Headache,
    AbdominalPain,
    NauseaVomiting,
    Dizziness,
    Fatigue,
    Cough,
    Rash,
    General,
}

impl Symptom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fever => "fever",
            Self::ChestPain => "chest_pain",
            Self::ShortnessOfBreath => "shortness_of_breath",
            Self::Headache => "headache",
            Self::AbdominalPain => "abdominal_pain",
            Self::NauseaVomiting => "nausea_vomiting",
            Self::Dizziness => "dizziness",
            Self::Fatigue => "fatigue",
            Self::Cough => "cough",
            Self::Rash => "rash",
            Self::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fever" => Some(Self::Fever),
            "chest_pain" => Some(Self::ChestPain),
            "shortness_of_breath" => Some(Self::ShortnessOfBreath),
            "headache" => Some(Self::Headache),
            "abdominal_pain" => Some(Self::AbdominalPain),
            "nausea_vomiting" => Some(Self::NauseaVomiting),
            "dizziness" => Some(Self::Dizziness),
            "fatigue" => Some(Self::Fatigue),
            "cough" => Some(Self::Cough),
            "rash" => Some(Self::Rash),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    /// Human-readable name, e.g. "chest pain".
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collected-information slot tracked per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    Temperature,
    Duration,
    Severity,
    Location,
    PainCharacter,
    Radiation,
    Breathing,
    Chills,
    BodyAches,
    Cough,
    Sputum,
    Nausea,
    Hydration,
    AssociatedSymptoms,
    Triggers,
    Progression,
    Medication,
    MedicalHistory,
}

impl Fact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Duration => "duration",
            Self::Severity => "severity",
            Self::Location => "location",
            Self::PainCharacter => "pain_character",
            Self::Radiation => "radiation",
            Self::Breathing => "breathing",
            Self::Chills => "chills",
            Self::BodyAches => "body_aches",
            Self::Cough => "cough",
            Self::Sputum => "sputum",
            Self::Nausea => "nausea",
            Self::Hydration => "hydration",
            Self::AssociatedSymptoms => "associated_symptoms",
            Self::Triggers => "triggers",
            Self::Progression => "progression",
            Self::Medication => "medication",
            Self::MedicalHistory => "medical_history",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "temperature" => Some(Self::Temperature),
            "duration" => Some(Self::Duration),
            "severity" => Some(Self::Severity),
            "location" => Some(Self::Location),
            "pain_character" => Some(Self::PainCharacter),
            "radiation" => Some(Self::Radiation),
            "breathing" => Some(Self::Breathing),
            "chills" => Some(Self::Chills),
            "body_aches" => Some(Self::BodyAches),
            "cough" => Some(Self::Cough),
            "sputum" => Some(Self::Sputum),
            "nausea" => Some(Self::Nausea),
            "hydration" => Some(Self::Hydration),
            "associated_symptoms" => Some(Self::AssociatedSymptoms),
            "triggers" => Some(Self::Triggers),
            "progression" => Some(Self::Progression),
            "medication" => Some(Self::Medication),
            "medical_history" => Some(Self::MedicalHistory),
            _ => None,
        }
    }

    /// Label used in recaps, e.g. "Pain character".
    pub fn label(&self) -> String {
        let spaced = self.as_str().replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Newtype wrappers
// =============================================================================

/// Unix timestamp in seconds (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.0, 0).unwrap_or_default()
    }
}

/// Maximum length of a session id.
pub const MAX_SESSION_ID_LENGTH: usize = 128;

/// Opaque caller-supplied session identifier.
///
/// Invariant: non-empty, at most 128 characters, and made only of ASCII
/// alphanumerics, `-` and `_`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MediscanError::Validation(
                "session id must not be empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_SESSION_ID_LENGTH {
            return Err(MediscanError::Validation(format!(
                "session id exceeds {} characters",
                MAX_SESSION_ID_LENGTH
            )));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(MediscanError::Validation(format!(
                "session id contains invalid characters: {}",
                trimmed
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = MediscanError;
    fn try_from(value: String) -> Result<Self> {
        SessionId::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
