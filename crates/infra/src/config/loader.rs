//! Configuration loader
//!
//! Loads executor configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `RESTCOLLECTOR_TIMEOUT_MS` is absent, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `RESTCOLLECTOR_TIMEOUT_MS`: Request timeout in milliseconds (required)
//! - `RESTCOLLECTOR_USER_AGENT`: User agent sent with every request
//! - `RESTCOLLECTOR_RETRIES`: Retry count; enables the default retry policy
//! - `RESTCOLLECTOR_RETRY_MIN_TIMEOUT_MS`: Delay before the first retry
//! - `RESTCOLLECTOR_RETRY_FACTOR`: Exponential backoff factor
//! - `RESTCOLLECTOR_RETRY_MAX_TIMEOUT_MS`: Upper bound for a single delay
//! - `RESTCOLLECTOR_RETRY_RANDOMIZE`: Randomize delays (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./restcollector.json` or `./restcollector.toml` (current working
//!    directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use restcollector_domain::{ExecutorConfig, RestCollectorError, Result, RetrySettings};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variable is missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `RestCollectorError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ExecutorConfig> {
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

/// Load configuration from environment variables
///
/// `RESTCOLLECTOR_TIMEOUT_MS` must be present. Retry settings are read only
/// when `RESTCOLLECTOR_RETRIES` is set; the other retry variables fall back
/// to their defaults.
///
/// # Errors
/// Returns `RestCollectorError::Config` if the required variable is missing
/// or any variable has an invalid value.
pub fn load_from_env() -> Result<ExecutorConfig> {
    let timeout_ms = env_var("RESTCOLLECTOR_TIMEOUT_MS").and_then(|s| parse(&s, "timeout"))?;
    let user_agent = std::env::var("RESTCOLLECTOR_USER_AGENT").ok();

    let retry = match std::env::var("RESTCOLLECTOR_RETRIES").ok() {
        Some(retries) => {
            let defaults = RetrySettings::default();
            Some(RetrySettings {
                retries: parse(&retries, "retry count")?,
                min_timeout_ms: env_parse("RESTCOLLECTOR_RETRY_MIN_TIMEOUT_MS", "retry min timeout")?
                    .unwrap_or(defaults.min_timeout_ms),
                factor: env_parse("RESTCOLLECTOR_RETRY_FACTOR", "retry factor")?
                    .unwrap_or(defaults.factor),
                max_timeout_ms: env_parse("RESTCOLLECTOR_RETRY_MAX_TIMEOUT_MS", "retry max timeout")?,
                randomize: env_bool("RESTCOLLECTOR_RETRY_RANDOMIZE", defaults.randomize),
            })
        }
        None => None,
    };

    let config = ExecutorConfig { timeout_ms, user_agent, retry };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `RestCollectorError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ExecutorConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(RestCollectorError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            RestCollectorError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| RestCollectorError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ExecutorConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| RestCollectorError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| RestCollectorError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(RestCollectorError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Returns the first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> Vec<PathBuf> {
    vec![
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("restcollector.json"),
        dir.join("restcollector.toml"),
        dir.join("../config.json"),
        dir.join("../config.toml"),
        dir.join("../../config.json"),
        dir.join("../../config.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        RestCollectorError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key).ok().map(|raw| parse(&raw, what)).transpose()
}

fn parse<T>(raw: &str, what: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| RestCollectorError::Config(format!("Invalid {}: {}", what, e)))
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
