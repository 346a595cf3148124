//! CLI argument definitions for the MediScan binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use mediscan_core::RiskLevel;
use mediscan_enrich::AnalysisKind;
use std::path::PathBuf;

/// MediScan: symptom intake and clinical result enrichment.
#[derive(Parser, Debug)]
#[command(name = "mediscan", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an interactive intake conversation on stdin.
    Chat {
        /// Resume or name a session. A fresh id is generated when omitted.
        #[arg(long = "session-id")]
        session_id: Option<String>,

        /// Enrich the final disposition with a summary, resources, and keywords.
        #[arg(long = "enrich")]
        enrich: bool,

        /// Free-text context passed along with enrichment requests.
        #[arg(long = "context")]
        context: Option<String>,
    },

    /// Enrich a single clinical result and print it as JSON.
    Enrich {
        /// Condition or finding to enrich, e.g. "melanoma".
        subject: String,

        /// Classifier confidence between 0 and 1.
        #[arg(long, default_value_t = 0.5)]
        confidence: f32,

        /// Risk level: low, medium, high, critical.
        #[arg(long, default_value = "medium")]
        risk: RiskLevel,

        /// Analysis kind: skin, radiology, triage.
        #[arg(long, default_value = "skin", value_parser = parse_kind)]
        kind: AnalysisKind,

        /// Recommendation to include; may be repeated.
        #[arg(long = "recommendation")]
        recommendations: Vec<String>,

        /// Free-text context for the summary provider.
        #[arg(long = "context")]
        context: Option<String>,
    },
}

fn parse_kind(s: &str) -> Result<AnalysisKind, String> {
    AnalysisKind::parse(s).ok_or_else(|| format!("Unknown analysis kind: {}", s))
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > MEDISCAN_CONFIG env var > ~/.mediscan/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("MEDISCAN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".mediscan").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".mediscan").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        let args =
            CliArgs::try_parse_from(["mediscan", "chat", "--session-id", "abc", "--enrich"]).unwrap();
        match args.command {
            Command::Chat {
                session_id, enrich, ..
            } => {
                assert_eq!(session_id.as_deref(), Some("abc"));
                assert!(enrich);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_enrich() {
        let args = CliArgs::try_parse_from([
            "mediscan",
            "-l",
            "debug",
            "enrich",
            "pneumonia",
            "--confidence",
            "0.82",
            "--risk",
            "high",
            "--kind",
            "radiology",
            "--recommendation",
            "Follow up with a physician",
            "--recommendation",
            "Repeat imaging in 6 weeks",
        ])
        .unwrap();
        assert_eq!(args.resolve_log_level("info"), "debug");
        match args.command {
            Command::Enrich {
                subject,
                confidence,
                risk,
                kind,
                recommendations,
                ..
            } => {
                assert_eq!(subject, "pneumonia");
                assert!((confidence - 0.82).abs() < f32::EPSILON);
                assert_eq!(risk, RiskLevel::High);
                assert_eq!(kind, AnalysisKind::Radiology);
                assert_eq!(recommendations.len(), 2);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = CliArgs::try_parse_from(["mediscan", "enrich", "x", "--kind", "dental"]);
        assert!(err.is_err());
    }

    #[test]
    fn test_config_flag_wins() {
        let args =
            CliArgs::try_parse_from(["mediscan", "--config", "/tmp/custom.toml", "chat"]).unwrap();
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/custom.toml"));
        assert_eq!(args.resolve_log_level("warn"), "warn");
    }
}
