//! Local keyword extraction over a medical lexicon.

use async_trait::async_trait;
use mediscan_core::RiskLevel;
use regex::Regex;

use crate::error::ProviderError;
use crate::provider::EnrichmentProvider;
use crate::types::{AnalysisKind, EnrichmentRequest, Keywords};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Condition,
    Symptom,
    Treatment,
    Procedure,
}

/// (category, pattern, canonical keyword). Patterns are case-insensitive.
const LEXICON: &[(Category, &str, &str)] = &[
    (Category::Condition, r"melanoma", "melanoma"),
    (Category::Condition, r"basal\s+cell\s+carcinoma", "basal cell carcinoma"),
    (Category::Condition, r"squamous\s+cell\s+carcinoma", "squamous cell carcinoma"),
    (Category::Condition, r"actinic\s+keratos[ie]s", "actinic keratosis"),
    (Category::Condition, r"seborrh?eic\s+keratos[ie]s", "seborrheic keratosis"),
    (Category::Condition, r"nev(?:us|i)|moles?", "nevus"),
    (Category::Condition, r"skin\s+cancer", "skin cancer"),
    (Category::Condition, r"pneumonia", "pneumonia"),
    (Category::Condition, r"pleural\s+effusion|effusion", "pleural effusion"),
    (Category::Condition, r"tuberculosis", "tuberculosis"),
    (Category::Condition, r"infection", "infection"),
    (Category::Condition, r"migraine", "migraine"),
    (Category::Condition, r"dehydration|dehydrated", "dehydration"),
    (Category::Symptom, r"fever|febrile", "fever"),
    (Category::Symptom, r"chest\s+pain", "chest pain"),
    (Category::Symptom, r"short(?:ness)?\s+of\s+breath|breathless", "shortness of breath"),
    (Category::Symptom, r"headaches?", "headache"),
    (Category::Symptom, r"cough(?:ing)?", "cough"),
    (Category::Symptom, r"nausea|vomiting", "nausea"),
    (Category::Symptom, r"dizz(?:y|iness)", "dizziness"),
    (Category::Symptom, r"fatigue|tired(?:ness)?", "fatigue"),
    (Category::Symptom, r"rash", "rash"),
    (Category::Symptom, r"itch(?:ing|y)?", "itching"),
    (Category::Symptom, r"bleeding", "bleeding"),
    (Category::Symptom, r"swelling", "swelling"),
    (Category::Symptom, r"lesions?", "skin lesion"),
    (Category::Treatment, r"excision|surgical\s+removal", "surgical excision"),
    (Category::Treatment, r"cryotherapy", "cryotherapy"),
    (Category::Treatment, r"antibiotics?", "antibiotics"),
    (Category::Treatment, r"topical", "topical treatment"),
    (Category::Treatment, r"monitor(?:ing)?", "monitoring"),
    (Category::Treatment, r"fluids|hydrat(?:e|ion)", "hydration"),
    (Category::Treatment, r"rest", "rest"),
    (Category::Treatment, r"acetaminophen|ibuprofen|fever\s+reducer", "fever reducer"),
    (Category::Treatment, r"sun\s*screen|sun\s+protection", "sun protection"),
    (Category::Procedure, r"biops(?:y|ies)", "biopsy"),
    (Category::Procedure, r"dermoscopy", "dermoscopy"),
    (Category::Procedure, r"dermatologist", "dermatological consultation"),
    (Category::Procedure, r"x-?ray", "chest x-ray"),
    (Category::Procedure, r"ct\s+scan", "ct scan"),
    (Category::Procedure, r"blood\s+tests?", "blood test"),
    (Category::Procedure, r"911|emergency\s+(?:room|department|services)", "emergency services"),
    (Category::Procedure, r"follow[-\s]up", "follow-up visit"),
];

/// Extracts keywords from the request subject, recommendations, and context.
pub struct LexiconKeywordProvider {
    patterns: Vec<(Category, Regex, &'static str)>,
    max_per_category: usize,
}

impl LexiconKeywordProvider {
    /// Create a provider with pre-compiled lexicon patterns.
    pub fn new(max_per_category: usize) -> Self {
        let patterns = LEXICON
            .iter()
            .map(|(category, pattern, keyword)| {
                let regex = Regex::new(&format!(r"(?i)\b(?:{})\b", pattern))
                    .expect("Invalid lexicon regex");
                (*category, regex, *keyword)
            })
            .collect();
        Self {
            patterns,
            max_per_category: max_per_category.max(1),
        }
    }

    /// Extract keywords from arbitrary text. Returns empty keywords on no match.
    pub fn extract(&self, text: &str, kind: AnalysisKind, risk: RiskLevel) -> Keywords {
        let mut keywords = Keywords::default();
        for (category, regex, keyword) in &self.patterns {
            if !regex.is_match(text) {
                continue;
            }
            let list = match category {
                Category::Condition => &mut keywords.conditions,
                Category::Symptom => &mut keywords.symptoms,
                Category::Treatment => &mut keywords.treatments,
                Category::Procedure => &mut keywords.procedures,
            };
            if !list.iter().any(|k| k == keyword) {
                list.push(keyword.to_string());
            }
        }

        if keywords.is_empty() {
            return keywords;
        }

        keywords.general.push(
            match kind {
                AnalysisKind::Skin => "dermatology",
                AnalysisKind::Radiology => "radiology",
                AnalysisKind::Triage => "medical triage",
            }
            .to_string(),
        );
        if matches!(risk, RiskLevel::High | RiskLevel::Critical) {
            keywords.general.push("time-sensitive".to_string());
            keywords.general.push("prompt medical attention".to_string());
        } else {
            keywords.general.push("routine follow-up".to_string());
        }

        keywords.truncate(self.max_per_category);
        keywords
    }
}

impl Default for LexiconKeywordProvider {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl EnrichmentProvider for LexiconKeywordProvider {
    type Output = Keywords;

    fn name(&self) -> &'static str {
        "keywords"
    }

    async fn fetch(&self, request: &EnrichmentRequest) -> Result<Keywords, ProviderError> {
        let mut text = request.subject.clone();
        for rec in &request.recommendations {
            text.push('\n');
            text.push_str(rec);
        }
        if let Some(ref ctx) = request.extra_context {
            text.push('\n');
            text.push_str(ctx);
        }

        let keywords = self.extract(&text, request.kind, request.risk);
        if keywords.is_empty() {
            return Err(ProviderError::EmptyPayload);
        }
        tracing::debug!(count = keywords.len(), "Lexicon keywords extracted");
        Ok(keywords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> LexiconKeywordProvider {
        LexiconKeywordProvider::new(8)
    }

    #[test]
    fn test_extract_categories() {
        let kw = provider().extract(
            "Melanoma suspected. Schedule a biopsy and see a dermatologist; monitor the lesion.",
            AnalysisKind::Skin,
            RiskLevel::High,
        );
        assert_eq!(kw.conditions, vec!["melanoma"]);
        assert_eq!(kw.symptoms, vec!["skin lesion"]);
        assert_eq!(kw.treatments, vec!["monitoring"]);
        assert_eq!(kw.procedures, vec!["biopsy", "dermatological consultation"]);
        assert_eq!(
            kw.general,
            vec!["dermatology", "time-sensitive", "prompt medical attention"]
        );
    }

    #[test]
    fn test_extract_is_case_insensitive_and_deduplicated() {
        let kw = provider().extract(
            "FEVER and fever, febrile since yesterday",
            AnalysisKind::Triage,
            RiskLevel::Low,
        );
        assert_eq!(kw.symptoms, vec!["fever"]);
        assert_eq!(kw.general, vec!["medical triage", "routine follow-up"]);
    }

    #[test]
    fn test_word_boundaries() {
        // "interest" must not match "rest", "molest" must not match "mole".
        let kw = provider().extract("interest molest", AnalysisKind::Skin, RiskLevel::Low);
        assert!(kw.is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        let kw = provider().extract("quarterly report", AnalysisKind::Skin, RiskLevel::Low);
        assert!(kw.is_empty());
        assert!(kw.general.is_empty());
    }

    #[test]
    fn test_cap_per_category() {
        let small = LexiconKeywordProvider::new(1);
        let kw = small.extract(
            "melanoma pneumonia infection",
            AnalysisKind::Skin,
            RiskLevel::High,
        );
        assert_eq!(kw.conditions.len(), 1);
        assert_eq!(kw.general.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_uses_recommendations_and_context() {
        let req = EnrichmentRequest::new("pneumonia", 0.8, RiskLevel::Medium)
            .with_kind(AnalysisKind::Radiology)
            .with_recommendations(vec!["Start antibiotics".to_string()])
            .with_context("follow-up x-ray in six weeks");
        let kw = provider().fetch(&req).await.unwrap();
        assert_eq!(kw.conditions, vec!["pneumonia"]);
        assert_eq!(kw.treatments, vec!["antibiotics"]);
        assert_eq!(kw.procedures, vec!["chest x-ray", "follow-up visit"]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_subject_is_empty_payload() {
        let req = EnrichmentRequest::new("zzz", 0.8, RiskLevel::Medium);
        let err = provider().fetch(&req).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyPayload));
    }
}
