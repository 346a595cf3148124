//! Error types for enrichment.

use mediscan_core::MediscanError;

/// Failure of a single provider call. Never escapes the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode provider response: {0}")]
    Decode(String),
    #[error("provider returned an empty payload")]
    EmptyPayload,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Http(err.to_string())
        }
    }
}

/// Construction-time errors for the orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("invalid enrichment budget: {0}")]
    InvalidBudget(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<MediscanError> for EnrichError {
    fn from(err: MediscanError) -> Self {
        EnrichError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::NotConfigured("GROQ_API_KEY is not set".to_string());
        assert_eq!(
            err.to_string(),
            "provider not configured: GROQ_API_KEY is not set"
        );

        let err = ProviderError::Status {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned status 429: rate limited");

        assert_eq!(
            ProviderError::EmptyPayload.to_string(),
            "provider returned an empty payload"
        );
    }

    #[test]
    fn test_enrich_error_from_mediscan_error() {
        let err: EnrichError = MediscanError::Config("bad".to_string()).into();
        assert!(matches!(err, EnrichError::Config(_)));
        assert!(err.to_string().contains("bad"));
    }
}
