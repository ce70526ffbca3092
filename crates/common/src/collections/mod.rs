//! Specialized data structures
//!
//! - **[`ordered_set`]**: insertion-ordered set used for key deduplication

pub mod ordered_set;

pub use ordered_set::OrderedSet;
