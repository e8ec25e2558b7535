//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//!
//! ## Environment Variables
//! - `TEMPO_DB_PATH`: Database file path (required for env loading)
//! - `TEMPO_DB_POOL_SIZE`: Connection pool size (default 4)
//! - `TEMPO_LOG_LEVEL`: Log filter level (default "info")
//!
//! ## File Locations
//! The loader probes `./tempo.toml` then `./config.toml` in the current
//! working directory.

use std::path::{Path, PathBuf};

use tempo_domain::{Config, DatabaseConfig, LogConfig, Result, TempoError};

/// Load configuration with automatic fallback strategy.
///
/// # Errors
/// Returns `TempoError::Config` if configuration cannot be loaded from
/// either source, the file format is invalid, or required fields are
/// missing.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables.
///
/// # Errors
/// Returns `TempoError::Config` if `TEMPO_DB_PATH` is missing or a numeric
/// variable fails to parse.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("TEMPO_DB_PATH")?;
    let pool_size = match std::env::var("TEMPO_DB_POOL_SIZE") {
        Ok(value) => value
            .parse::<u32>()
            .map_err(|e| TempoError::Config(format!("Invalid pool size: {e}")))?,
        Err(_) => 4,
    };
    let level = std::env::var("TEMPO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size },
        log: LogConfig { level },
    })
}

/// Load configuration from a TOML file.
///
/// When `path` is `None`, probes the default locations.
///
/// # Errors
/// Returns `TempoError::Config` when no file is found or parsing fails.
pub fn load_from_file(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => probe_default_paths().ok_or_else(|| {
            TempoError::Config("no configuration file found (tried tempo.toml, config.toml)".into())
        })?,
    };

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| TempoError::Config(format!("cannot read {}: {e}", path.display())))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| TempoError::Config(format!("cannot parse {}: {e}", path.display())))?;

    tracing::info!(path = %path.display(), "Configuration loaded from file");
    Ok(config)
}

fn probe_default_paths() -> Option<PathBuf> {
    ["tempo.toml", "config.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.is_file())
}

fn env_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| TempoError::Config(format!("missing environment variable {name}")))
}
