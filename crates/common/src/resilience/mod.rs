//! Resilience patterns for fault tolerance
//!
//! - **Retry**: re-run a fallible async operation with configurable backoff,
//!   jitter and a per-attempt observer. The last error is returned unchanged
//!   once retries are exhausted.

pub mod retry;

// Re-export retry types
pub use retry::{
    retry_with_config, AttemptObserver, BackoffStrategy, FailedAttempt, Jitter, RetryConfig,
    RetryConfigBuilder, RetryConfigError, RetryExecutor, RetryOutcome,
};
