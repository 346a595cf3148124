//! Deterministic, subject-keyed local fallbacks, one per provider slot.
//!
//! Every function here returns a non-empty payload for any input.

use mediscan_core::RiskLevel;

use crate::types::{AnalysisKind, EnrichmentRequest, Keywords, Resource, Summary};

struct ConditionTemplate {
    key: &'static str,
    name: &'static str,
    description: &'static str,
    explanation: &'static str,
}

/// Matched by substring against the lowercased subject, in order.
const CONDITIONS: &[ConditionTemplate] = &[
    ConditionTemplate {
        key: "basal cell carcinoma",
        name: "Basal Cell Carcinoma",
        description: "This is the most common form of skin cancer. It grows slowly and rarely spreads to other parts of the body, but early treatment prevents complications.",
        explanation: "Basal Cell Carcinoma develops in the basal cells of the skin's outer layer. It typically appears as a pearly or waxy bump, a flat scar-like lesion, or a sore that heals and returns. It is highly treatable when caught early.",
    },
    ConditionTemplate {
        key: "squamous cell carcinoma",
        name: "Squamous Cell Carcinoma",
        description: "This is the second most common type of skin cancer and can be more aggressive than basal cell carcinoma.",
        explanation: "Squamous Cell Carcinoma arises from squamous cells in the skin's upper layers. It often appears as a firm red nodule or a flat lesion with a scaly, crusted surface. Early detection and treatment result in excellent outcomes.",
    },
    ConditionTemplate {
        key: "melanoma",
        name: "Melanoma",
        description: "This is the most serious type of skin cancer and can spread rapidly if not treated early.",
        explanation: "Melanoma develops in melanocytes, the cells that produce pigment. It may arise from an existing mole or appear as a new, unusual growth. Early detection is crucial because melanoma can spread to lymph nodes and other organs.",
    },
    ConditionTemplate {
        key: "actinic keratosis",
        name: "Actinic Keratosis",
        description: "This is a precancerous condition caused by sun damage that can develop into squamous cell carcinoma.",
        explanation: "Actinic Keratosis appears as rough, scaly patches on sun-exposed skin. It is not cancer itself, but treatment can prevent progression and is typically straightforward.",
    },
    ConditionTemplate {
        key: "seborrheic keratosis",
        name: "Seborrheic Keratosis",
        description: "This is a common, benign skin growth that typically appears with age.",
        explanation: "Seborrheic Keratosis appears as waxy, scaly, or slightly raised growths ranging from light tan to black. They are usually harmless but can resemble other conditions, so professional evaluation confirms the diagnosis.",
    },
    ConditionTemplate {
        key: "nevus",
        name: "Nevus (mole)",
        description: "This appears to be a common skin growth that is typically benign.",
        explanation: "A nevus is a common growth often called a mole. Changes in size, shape, color, or texture should be evaluated by a healthcare professional.",
    },
    ConditionTemplate {
        key: "pneumonia",
        name: "Pneumonia",
        description: "This is an infection that inflames the air sacs in one or both lungs and may need prompt treatment.",
        explanation: "Pneumonia can be caused by bacteria, viruses, or fungi. On imaging it typically shows as areas of consolidation. Severity ranges from mild to life-threatening, so clinical correlation is important.",
    },
    ConditionTemplate {
        key: "chest pain",
        name: "Chest pain",
        description: "Chest pain can have cardiac, lung, muscular, or digestive causes and always deserves careful evaluation.",
        explanation: "Pain that is crushing, spreads to the arm, jaw, or back, or comes with shortness of breath or sweating may signal a heart problem and needs emergency care.",
    },
    ConditionTemplate {
        key: "shortness of breath",
        name: "Shortness of breath",
        description: "Difficulty breathing can come from the lungs, the heart, or anxiety and may need urgent evaluation.",
        explanation: "Breathlessness at rest, bluish lips, or inability to speak in full sentences are signs of respiratory distress that require immediate care.",
    },
    ConditionTemplate {
        key: "fever",
        name: "Fever",
        description: "Fever is the body's response to infection or inflammation.",
        explanation: "Most fevers resolve with rest and fluids. A very high temperature, a stiff neck, confusion, or a fever lasting more than three days needs medical attention.",
    },
    ConditionTemplate {
        key: "headache",
        name: "Headache",
        description: "Most headaches are tension-type or migraine and are not dangerous.",
        explanation: "A sudden, severe headache, or one with fever, stiff neck, weakness, or vision changes, may indicate a serious condition and needs prompt evaluation.",
    },
];

fn percent(confidence: f32) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Plain-language reading of a confidence score.
pub fn confidence_note(confidence: f32) -> String {
    let pct = percent(confidence);
    if confidence >= 0.8 {
        format!("High confidence ({pct}) indicates strong certainty in the assessment based on clear features.")
    } else if confidence >= 0.6 {
        format!("Good confidence ({pct}) shows reasonable certainty, with professional confirmation recommended.")
    } else if confidence >= 0.4 {
        format!("Moderate confidence ({pct}) suggests some uncertainty, making professional evaluation important.")
    } else {
        format!("Low confidence ({pct}) indicates significant uncertainty, requiring professional medical assessment.")
    }
}

/// Plain-language reading of a risk level.
pub fn risk_note(risk: RiskLevel) -> String {
    match risk {
        RiskLevel::Critical => "Critical risk indicates features requiring emergency medical evaluation.",
        RiskLevel::High => "High risk indicates features that may suggest a serious condition requiring immediate medical attention.",
        RiskLevel::Medium => "Medium risk indicates features that warrant professional evaluation within a reasonable timeframe.",
        RiskLevel::Low => "Low risk indicates features that appear benign but should still be monitored regularly.",
    }
    .to_string()
}

/// Templated summary keyed by condition name.
pub fn summary(request: &EnrichmentRequest) -> Summary {
    let subject = request.subject_label();
    let lowered = subject.to_lowercase();
    let pct = percent(request.confidence);
    let risk = request.risk.as_str();

    let (text, explanation) = match CONDITIONS.iter().find(|c| lowered.contains(c.key)) {
        Some(template) => (
            format!(
                "{} identified with {} confidence. {} The {} risk assessment guides how quickly follow-up care is needed.",
                template.name, pct, template.description, risk
            ),
            template.explanation.to_string(),
        ),
        None => match request.kind {
            AnalysisKind::Triage => (
                format!(
                    "Intake assessment for {} completed with a {} risk classification.",
                    subject, risk
                ),
                format!(
                    "A healthcare provider can review the reported {} symptoms, examine you, and decide whether tests or treatment are needed.",
                    subject
                ),
            ),
            AnalysisKind::Radiology => (
                format!(
                    "{} identified on imaging with {} confidence. The {} risk assessment guides the urgency of follow-up care.",
                    subject, pct, risk
                ),
                format!(
                    "A radiologist and treating physician should correlate the finding of {} with symptoms and examination before any treatment decision.",
                    subject
                ),
            ),
            AnalysisKind::Skin => (
                format!(
                    "{} detected with {} confidence. This skin condition requires professional evaluation for accurate diagnosis. The {} risk assessment guides the urgency of follow-up care.",
                    subject, pct, risk
                ),
                format!(
                    "Professional dermatological evaluation is recommended for {}. A qualified provider can examine the lesion, possibly with dermoscopy or biopsy, and recommend treatment.",
                    subject
                ),
            ),
        },
    };

    Summary {
        text,
        explanation,
        confidence_note: confidence_note(request.confidence),
        risk_note: risk_note(request.risk),
    }
}

/// A short static list of trusted reference links.
pub fn resources(request: &EnrichmentRequest) -> Vec<Resource> {
    let subject = request.subject_label();
    let resource = |title: String, url: &str, source: &str, snippet: String| Resource {
        title,
        url: url.to_string(),
        source: source.to_string(),
        snippet,
    };

    match request.kind {
        AnalysisKind::Skin => vec![
            resource(
                format!("Understanding {subject}: Medical Overview"),
                "https://www.mayoclinic.org/diseases-conditions/skin-cancer",
                "Mayo Clinic",
                format!("Medical information about {subject} including symptoms, diagnosis, and treatment options."),
            ),
            resource(
                "Dermatology Guidelines and Best Practices".to_string(),
                "https://www.aad.org/public/diseases/skin-cancer",
                "American Academy of Dermatology",
                format!("Professional guidance on {subject} diagnosis and treatment."),
            ),
            resource(
                "When to See a Dermatologist".to_string(),
                "https://www.aad.org/public/everyday-care/when-to-see-dermatologist",
                "American Academy of Dermatology",
                "When to seek professional dermatological care and evaluation.".to_string(),
            ),
        ],
        AnalysisKind::Radiology => vec![
            resource(
                format!("Understanding {subject}"),
                "https://www.radiologyinfo.org/en/info/chestrad",
                "RadiologyInfo.org",
                format!("Patient information about chest imaging and findings such as {subject}."),
            ),
            resource(
                "Lung conditions overview".to_string(),
                "https://www.mayoclinic.org/diseases-conditions/pneumonia",
                "Mayo Clinic",
                "Symptoms, causes, diagnosis, and treatment of common lung conditions.".to_string(),
            ),
        ],
        AnalysisKind::Triage => vec![
            resource(
                format!("{subject}: symptoms and self-care"),
                "https://medlineplus.gov/ency/",
                "MedlinePlus",
                format!("Trusted information about {subject}, when to seek care, and home treatment."),
            ),
            resource(
                "When to seek emergency care".to_string(),
                "https://www.cdc.gov/",
                "Centers for Disease Control and Prevention",
                "Warning signs that need immediate medical attention.".to_string(),
            ),
            resource(
                "Symptom checker".to_string(),
                "https://www.mayoclinic.org/symptom-checker/select-symptom/itt-20009075",
                "Mayo Clinic",
                "Explore possible causes of common symptoms.".to_string(),
            ),
        ],
    }
}

/// A keyword set drawn from a local table keyed by subject and analysis kind.
pub fn keywords(request: &EnrichmentRequest) -> Keywords {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let subject = request.subject.trim().to_lowercase();

    let mut treatments = Vec::new();
    let mut procedures = Vec::new();
    for rec in &request.recommendations {
        let rec = rec.to_lowercase();
        let cues: [(&str, &str, bool); 6] = [
            ("dermatologist", "dermatological consultation", false),
            ("biopsy", "biopsy", false),
            ("x-ray", "chest x-ray", false),
            ("911", "emergency services", false),
            ("monitor", "monitoring", true),
            ("treatment", "medical treatment", true),
        ];
        for (cue, keyword, is_treatment) in cues {
            if rec.contains(cue) {
                let list = if is_treatment {
                    &mut treatments
                } else {
                    &mut procedures
                };
                if !list.iter().any(|k: &String| k == keyword) {
                    list.push(keyword.to_string());
                }
            }
        }
    }
    if treatments.is_empty() {
        treatments.push("medical evaluation".to_string());
    }
    if procedures.is_empty() {
        procedures.push("clinical examination".to_string());
    }

    let (symptoms, general) = match request.kind {
        AnalysisKind::Skin => (
            owned(&["skin lesion", "skin growth"]),
            owned(&["dermatology", "skin health", "medical diagnosis"]),
        ),
        AnalysisKind::Radiology => (
            owned(&["chest findings"]),
            owned(&["radiology", "chest imaging", "medical diagnosis"]),
        ),
        AnalysisKind::Triage => (
            if subject.is_empty() {
                Vec::new()
            } else {
                vec![subject.clone()]
            },
            owned(&["medical triage", "symptom assessment", "healthcare"]),
        ),
    };

    Keywords {
        conditions: if subject.is_empty() {
            Vec::new()
        } else {
            vec![subject]
        },
        symptoms,
        treatments,
        procedures,
        general,
    }
}
