//! Tracing subscriber setup shared by binaries.

use tracing_subscriber::EnvFilter;

/// Build the filter used by the subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (from the CLI or config) is used.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Calling it twice is harmless.
pub fn init(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_target(false)
        .try_init();
}
