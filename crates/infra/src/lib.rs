//! # RestCollector Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The `reqwest`-backed [`HttpExecutor`](restcollector_core::HttpExecutor)
//! - Executor configuration loading (environment, JSON, TOML)
//! - Conversions from `reqwest` errors into domain errors
//!
//! ## Architecture
//! - Implements traits defined in `restcollector-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod config;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{ReqwestExecutor, ReqwestExecutorBuilder};
