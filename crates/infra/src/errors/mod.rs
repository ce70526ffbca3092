//! Infrastructure error handling

mod conversions;

pub use conversions::{transport_error, InfraError};
