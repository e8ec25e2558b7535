//! Logging initialisation.
//!
//! `RUST_LOG` wins over the configured level so operators can raise
//! verbosity without touching the config file.

use tempo_domain::LogConfig;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber. Idempotent: repeated calls
/// (tests, embedded use) leave the first subscriber in place.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
