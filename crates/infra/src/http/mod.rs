//! HTTP executor adapter

mod client;

pub use client::{ReqwestExecutor, ReqwestExecutorBuilder};
