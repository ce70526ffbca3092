//! # RestCollector Core
//!
//! Merge-fetch engine - no transport code.
//!
//! This crate contains:
//! - The [`HttpExecutor`] and [`DecorateRequest`] ports
//! - Attribute mappers and their registration descriptors
//! - The [`RestCollectorClient`] that fetches, fans out and merges
//!
//! ## Architecture Principles
//! - Only depends on `restcollector-common` and `restcollector-domain`
//! - All network access goes through [`HttpExecutor`]
//! - Mapper state lives for exactly one request

pub mod collector;

pub use collector::{
    fill_params, retries_from_settings, AttributeMapper, BeforeHook, DecorateRequest, Fetched,
    HttpExecutor, MapperConfig, MergeFn, QueryContext, RequestOptions, RestCollectorClient,
    RestCollectorResult, Retries,
};
