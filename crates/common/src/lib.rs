//! Modular common utilities shared across RestCollector crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: collections
//! - `runtime`: async infrastructure (resilience)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod collections;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types
// ------------------------
#[cfg(feature = "foundation")]
pub use collections::OrderedSet;
#[cfg(feature = "runtime")]
pub use resilience::{
    retry_with_config, BackoffStrategy, FailedAttempt, Jitter, RetryConfig, RetryConfigBuilder,
    RetryConfigError, RetryExecutor, RetryOutcome,
};
