use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{MediscanError, Result};

/// Top-level configuration for MediScan.
///
/// Loaded from `~/.mediscan/config.toml` by default. Every section falls back
/// to its defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediscanConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub triage: TriageConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
}

impl MediscanConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: MediscanConfig = toml::from_str(&content)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MediscanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.triage.validate()?;
        self.enrichment.validate()
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Intake conversation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Maximum accepted message length in characters.
    pub max_message_length: usize,
    /// Number of recent messages considered when identifying the primary symptom.
    pub history_window: usize,
    /// Collected facts needed to reach the final assessment.
    pub final_fact_threshold: usize,
    /// Patient turns after which the assessment is finalized regardless of facts.
    pub max_turns: usize,
    /// Temperatures at or above this (Fahrenheit) are an emergency.
    pub emergency_temperature_f: f32,
    /// Temperatures at or above this (Fahrenheit) are urgent.
    pub urgent_temperature_f: f32,
    /// Temperatures at or above this raise the high-fever red flag.
    pub high_fever_flag_f: f32,
    /// Severity ratings (out of 10) at or above this are urgent.
    pub urgent_severity: u8,
    /// Whether an explicit de-escalation phrase may lower urgency.
    pub allow_de_escalation: bool,
    /// Optional path to a rule book overriding the built-in one.
    pub rules_path: Option<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            history_window: 10,
            final_fact_threshold: 6,
            max_turns: 12,
            emergency_temperature_f: 103.0,
            urgent_temperature_f: 100.4,
            high_fever_flag_f: 104.0,
            urgent_severity: 8,
            allow_de_escalation: true,
            rules_path: None,
        }
    }
}

impl TriageConfig {
    fn validate(&self) -> Result<()> {
        if self.max_message_length == 0 {
            return Err(MediscanError::Config(
                "triage.max_message_length must be positive".to_string(),
            ));
        }
        if self.final_fact_threshold == 0 || self.max_turns == 0 {
            return Err(MediscanError::Config(
                "triage.final_fact_threshold and triage.max_turns must be positive".to_string(),
            ));
        }
        if self.urgent_temperature_f >= self.emergency_temperature_f {
            return Err(MediscanError::Config(format!(
                "triage.urgent_temperature_f ({}) must be below emergency_temperature_f ({})",
                self.urgent_temperature_f, self.emergency_temperature_f
            )));
        }
        Ok(())
    }
}

/// Enrichment orchestration budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Per-provider timeout in milliseconds.
    pub provider_timeout_ms: u64,
    /// Outer deadline for the whole enrichment call in milliseconds.
    pub outer_deadline_ms: u64,
    /// Maximum number of resources kept from a provider.
    pub max_resources: usize,
    /// Maximum keywords kept per category.
    pub max_keywords_per_category: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 2000,
            outer_deadline_ms: 3000,
            max_resources: 5,
            max_keywords_per_category: 8,
        }
    }
}

impl EnrichmentConfig {
    fn validate(&self) -> Result<()> {
        if self.provider_timeout_ms == 0 {
            return Err(MediscanError::Config(
                "enrichment.provider_timeout_ms must be positive".to_string(),
            ));
        }
        if self.outer_deadline_ms <= self.provider_timeout_ms {
            return Err(MediscanError::Config(format!(
                "enrichment.outer_deadline_ms ({}) must exceed provider_timeout_ms ({})",
                self.outer_deadline_ms, self.provider_timeout_ms
            )));
        }
        if self.max_resources == 0 || self.max_keywords_per_category == 0 {
            return Err(MediscanError::Config(
                "enrichment.max_resources and max_keywords_per_category must be positive"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote provider endpoints. API keys are read from the named env vars.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// OpenAI-compatible chat completions base URL for summaries.
    pub summary_base_url: String,
    pub summary_model: String,
    pub summary_api_key_env: String,
    /// Web search endpoint for reference resources.
    pub resources_url: String,
    pub resources_api_key_env: String,
    /// Domains the resource search is restricted to.
    pub trusted_domains: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            summary_base_url: "https://api.groq.com/openai/v1".to_string(),
            summary_model: "llama3-8b-8192".to_string(),
            summary_api_key_env: "GROQ_API_KEY".to_string(),
            resources_url: "https://api.tavily.com/search".to_string(),
            resources_api_key_env: "TAVILY_API_KEY".to_string(),
            trusted_domains: vec![
                "mayoclinic.org".to_string(),
                "aad.org".to_string(),
                "cdc.gov".to_string(),
                "nih.gov".to_string(),
                "medlineplus.gov".to_string(),
                "webmd.com".to_string(),
                "healthline.com".to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MediscanConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.triage.max_message_length, 2000);
        assert_eq!(config.triage.final_fact_threshold, 6);
        assert!((config.triage.emergency_temperature_f - 103.0).abs() < f32::EPSILON);
        assert!(config.triage.allow_de_escalation);
        assert_eq!(config.enrichment.provider_timeout_ms, 2000);
        assert_eq!(config.enrichment.outer_deadline_ms, 3000);
        assert_eq!(config.providers.summary_api_key_env, "GROQ_API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[triage]
max_turns = 8

[enrichment]
outer_deadline_ms = 5000
"#;
        let config: MediscanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.triage.max_turns, 8);
        assert_eq!(config.triage.history_window, 10);
        assert_eq!(config.enrichment.outer_deadline_ms, 5000);
        assert_eq!(config.enrichment.provider_timeout_ms, 2000);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: MediscanConfig = toml::from_str("").unwrap();
        assert_eq!(config.triage.max_message_length, 2000);
        assert_eq!(config.providers.resources_api_key_env, "TAVILY_API_KEY");
    }

    #[test]
    fn test_provider_keys_from_toml() {
        let toml_str = r#"
[providers]
summary_base_url = "http://localhost:8080/v1"
resources_url = "http://localhost:9090/search"
resources_api_key_env = "SEARCH_KEY"
trusted_domains = ["nih.gov"]
"#;
        let config: MediscanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.summary_base_url, "http://localhost:8080/v1");
        assert_eq!(config.providers.resources_url, "http://localhost:9090/search");
        assert_eq!(config.providers.resources_api_key_env, "SEARCH_KEY");
        assert_eq!(config.providers.trusted_domains, vec!["nih.gov".to_string()]);
        assert_eq!(config.providers.summary_model, "llama3-8b-8192");
    }

    #[test]
    fn test_validate_rejects_deadline_not_above_provider_timeout() {
        let mut config = MediscanConfig::default();
        config.enrichment.outer_deadline_ms = 2000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("outer_deadline_ms"));
    }

    #[test]
    fn test_validate_rejects_inverted_temperatures() {
        let mut config = MediscanConfig::default();
        config.triage.urgent_temperature_f = 104.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = MediscanConfig::default();
        config.general.log_level = "debug".to_string();
        config.triage.rules_path = Some("/etc/mediscan/rules.toml".to_string());
        config.save(&path).unwrap();

        let loaded = MediscanConfig::load(&path).unwrap();
        assert_eq!(loaded.general.log_level, "debug");
        assert_eq!(
            loaded.triage.rules_path.as_deref(),
            Some("/etc/mediscan/rules.toml")
        );
    }

    #[test]
    fn test_load_rejects_invalid_budgets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[enrichment]\nprovider_timeout_ms = 4000\nouter_deadline_ms = 3000\n",
        )
        .unwrap();
        assert!(MediscanConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = MediscanConfig::load_or_default(Path::new("/nonexistent/mediscan.toml"));
        assert_eq!(config.triage.max_turns, 12);
    }
}
