use thiserror::Error;

/// Top-level error type for MediScan.
///
/// Subsystem crates define their own error types and convert from
/// `MediscanError` so that `?` works across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MediscanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for MediscanError {
    fn from(err: toml::de::Error) -> Self {
        MediscanError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MediscanError {
    fn from(err: toml::ser::Error) -> Self {
        MediscanError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MediscanError {
    fn from(err: serde_json::Error) -> Self {
        MediscanError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for MediScan operations.
pub type Result<T> = std::result::Result<T, MediscanError>;
