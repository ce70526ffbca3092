//! Library-wide constants
//!
//! Defaults mirror the retry knobs callers know from most HTTP retry
//! libraries: ten retries, one second minimum delay, doubling each attempt.

// Retry defaults
pub const DEFAULT_RETRIES: u32 = 10;
pub const DEFAULT_RETRY_MIN_TIMEOUT_MS: u64 = 1_000;
pub const DEFAULT_RETRY_FACTOR: f64 = 2.0;

// Executor defaults
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_USER_AGENT: &str = concat!("restcollector/", env!("CARGO_PKG_VERSION"));

/// Highest status code still treated as success.
pub const MAX_SUCCESS_STATUS: u16 = 299;
