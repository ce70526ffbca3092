//! Per-request options and the result returned to callers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use restcollector_common::resilience::{BackoffStrategy, Jitter, RetryConfig};
use restcollector_domain::{Headers, RestCollectorError, RetrySettings};
use serde::Serialize;
use serde_json::{Map, Value};

/// Retry policy applied to top-level requests and mapper queries.
pub type Retries = RetryConfig<RestCollectorError>;

/// Options accepted by every verb entry point.
pub struct RequestOptions<B = ()> {
    /// Query object sent with the primary request.
    pub query: Option<Value>,
    /// Values substituted into `{name}` placeholders of the entity URL.
    pub params: Option<Map<String, Value>>,
    /// Explicit URL; takes precedence over the client's entity URL.
    pub url: Option<String>,
    /// Caller context handed to the request decorator.
    pub bag: Option<Arc<B>>,
    /// Body sent with the primary request.
    pub data: Option<Value>,
    pub timeout: Option<Duration>,
    /// Retry policy wrapping the whole request, mapper fan-out included.
    pub retry: Option<Retries>,
}

impl<B> Default for RequestOptions<B> {
    fn default() -> Self {
        Self {
            query: None,
            params: None,
            url: None,
            bag: None,
            data: None,
            timeout: None,
            retry: None,
        }
    }
}

impl<B> Clone for RequestOptions<B> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            params: self.params.clone(),
            url: self.url.clone(),
            bag: self.bag.clone(),
            data: self.data.clone(),
            timeout: self.timeout,
            retry: self.retry.clone(),
        }
    }
}

impl<B> fmt::Debug for RequestOptions<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("query", &self.query)
            .field("params", &self.params)
            .field("url", &self.url)
            .field("bag", &self.bag.is_some())
            .field("data", &self.data)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl<B> RequestOptions<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: Value) -> Self {
        self.query = Some(query);
        self
    }

    /// Set a single path parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.get_or_insert_with(Map::new).insert(name.into(), value.into());
        self
    }

    pub fn params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn bag(mut self, bag: B) -> Self {
        self.bag = Some(Arc::new(bag));
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn retry(mut self, retry: Retries) -> Self {
        self.retry = Some(retry);
        self
    }
}

/// Entities returned by a merge-fetch, in the shape the server sent them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fetched<E> {
    /// The primary response body was an array.
    Many(Vec<E>),
    /// The primary response body was a single object.
    One(E),
}

impl<E> Fetched<E> {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn as_many(&self) -> Option<&[E]> {
        match self {
            Self::Many(items) => Some(items),
            Self::One(_) => None,
        }
    }

    pub fn as_one(&self) -> Option<&E> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// Flatten into a vector regardless of shape.
    pub fn into_vec(self) -> Vec<E> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Successful merge-fetch result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestCollectorResult<E> {
    pub data: Fetched<E>,
    /// Headers of the primary response.
    pub headers: Headers,
    /// Status of the primary response.
    pub status: u16,
}

/// Build a retry policy from serializable settings.
pub fn retries_from_settings(settings: &RetrySettings) -> Retries {
    let mut config = Retries::default();
    config.retries = settings.retries;
    config.backoff = BackoffStrategy::Exponential {
        initial_delay: Duration::from_millis(settings.min_timeout_ms),
        base: settings.factor,
        max_delay: settings.max_timeout_ms.map(Duration::from_millis),
    };
    config.jitter = if settings.randomize { Jitter::Randomize } else { Jitter::None };
    config
}
