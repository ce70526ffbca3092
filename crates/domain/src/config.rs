//! Configuration structures

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_RETRIES, DEFAULT_RETRY_FACTOR,
    DEFAULT_RETRY_MIN_TIMEOUT_MS,
};
use crate::{RestCollectorError, Result};

/// Settings for the HTTP executor adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Client-wide request timeout; per-request timeouts override it.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Default top-level retry settings. Converted into a policy and
    /// installed on a client with `with_default_retry`.
    #[serde(default)]
    pub retry: Option<RetrySettings>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS, user_agent: None, retry: None }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Reject values the executor cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(RestCollectorError::Config("timeout_ms must be greater than 0".into()));
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }
}

/// Serializable retry knobs: retry count plus an exponential schedule
/// `min_timeout * factor^n`, optionally capped and randomized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_min_timeout_ms")]
    pub min_timeout_ms: u64,
    #[serde(default = "default_factor")]
    pub factor: f64,
    #[serde(default)]
    pub max_timeout_ms: Option<u64>,
    #[serde(default)]
    pub randomize: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            min_timeout_ms: DEFAULT_RETRY_MIN_TIMEOUT_MS,
            factor: DEFAULT_RETRY_FACTOR,
            max_timeout_ms: None,
            randomize: false,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<()> {
        if self.factor <= 0.0 {
            return Err(RestCollectorError::Config("retry factor must be greater than 0".into()));
        }
        if let Some(max) = self.max_timeout_ms {
            if max < self.min_timeout_ms {
                return Err(RestCollectorError::Config(format!(
                    "retry max_timeout_ms ({max}) is below min_timeout_ms ({})",
                    self.min_timeout_ms
                )));
            }
        }
        Ok(())
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

fn default_min_timeout_ms() -> u64 {
    DEFAULT_RETRY_MIN_TIMEOUT_MS
}

fn default_factor() -> f64 {
    DEFAULT_RETRY_FACTOR
}
