//! Merge-fetch collector
//!
//! A [`RestCollectorClient`] fetches primary entities, runs every registered
//! [`MapperConfig`] as one deduplicated secondary lookup, and merges the
//! results back onto each entity.

pub mod mapper;
pub mod options;
pub mod params;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use mapper::{AttributeMapper, BeforeHook, MapperConfig, MergeFn, QueryContext};
pub use options::{retries_from_settings, Fetched, RequestOptions, RestCollectorResult, Retries};
pub use params::fill_params;
pub use ports::{DecorateRequest, HttpExecutor};
pub use service::RestCollectorClient;
