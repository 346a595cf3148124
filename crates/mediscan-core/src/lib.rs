//! Shared domain types, configuration, and error handling for MediScan.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::MediscanConfig;
pub use error::{MediscanError, Result};
pub use types::*;
