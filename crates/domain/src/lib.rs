//! # RestCollector Domain
//!
//! Shared types for the RestCollector workspace.
//!
//! This crate contains:
//! - Error types and the `Result` alias
//! - Wire types exchanged with HTTP executors (`OutgoingRequest`,
//!   `RestResponse`, `Headers`)
//! - The `Entity` trait and `JoinKey` used for mapper joins
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other RestCollector crates
//! - Only external dependencies allowed

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
