//! Error types for the intake conversation engine.

use mediscan_core::MediscanError;

/// Errors from the triage service and session store.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    UnknownSession(String),
    #[error("rule book error: {0}")]
    Rules(String),
    #[error("session store error: {0}")]
    Store(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<MediscanError> for TriageError {
    fn from(err: MediscanError) -> Self {
        match err {
            MediscanError::Validation(msg) => TriageError::InvalidSessionId(msg),
            other => TriageError::Config(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for TriageError {
    fn from(err: toml::de::Error) -> Self {
        TriageError::Rules(err.to_string())
    }
}
