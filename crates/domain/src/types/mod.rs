//! Domain types shared by the engine and its adapters

pub mod entity;
pub mod http;

pub use entity::{Entity, JoinKey};
pub use http::{Headers, HttpMethod, OutgoingRequest, RestResponse};
