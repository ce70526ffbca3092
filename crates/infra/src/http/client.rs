use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method};
use restcollector_core::HttpExecutor;
use restcollector_domain::constants::{DEFAULT_REQUEST_TIMEOUT_MS, DEFAULT_USER_AGENT};
use restcollector_domain::{
    ExecutorConfig, Headers, HttpMethod, OutgoingRequest, RestCollectorError, RestResponse,
    TransportError,
};
use serde_json::Value;
use tracing::debug;

use crate::errors::{transport_error, InfraError};

/// [`HttpExecutor`] backed by a shared `reqwest` client.
///
/// Every response is returned as-is, whatever its status. Only requests that
/// produced no response surface as [`TransportError`].
#[derive(Clone)]
pub struct ReqwestExecutor {
    client: ReqwestClient,
}

impl ReqwestExecutor {
    /// Start building a new executor.
    pub fn builder() -> ReqwestExecutorBuilder {
        ReqwestExecutorBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, RestCollectorError> {
        Self::builder().build()
    }

    /// Build an executor from loaded settings.
    pub fn from_config(config: &ExecutorConfig) -> Result<Self, RestCollectorError> {
        config.validate()?;
        let mut builder = Self::builder().timeout(config.timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: OutgoingRequest) -> Result<RestResponse, TransportError> {
        let OutgoingRequest { method, url, query, body, headers, timeout } = request;

        let mut builder = self.client.request(to_reqwest_method(method), url.as_str());
        if let Some(query) = &query {
            builder = builder.query(&query_pairs(query));
        }
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &body {
            builder = builder.json(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        debug!(%method, %url, "sending HTTP request");

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            transport_error(err)
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");

        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.append(name.as_str(), value);
            }
        }

        let bytes = response.bytes().await.map_err(transport_error)?;

        Ok(RestResponse { status: status.as_u16(), headers: response_headers, body: parse_body(&bytes) })
    }
}

/// Builder for [`ReqwestExecutor`].
#[derive(Debug)]
pub struct ReqwestExecutorBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Headers,
}

impl Default for ReqwestExecutorBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            user_agent: None,
            default_headers: Headers::new(),
        }
    }
}

impl ReqwestExecutorBuilder {
    /// Client-wide timeout. A request's own timeout takes precedence.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Header sent with every request unless the request sets it itself.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.set(name, value);
        self
    }

    pub fn default_headers(mut self, headers: Headers) -> Self {
        self.default_headers.merge(&headers);
        self
    }

    pub fn build(self) -> Result<ReqwestExecutor, RestCollectorError> {
        let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout).user_agent(agent).no_proxy();

        if !self.default_headers.is_empty() {
            builder = builder.default_headers(to_header_map(&self.default_headers)?);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            RestCollectorError::from(infra)
        })?;

        Ok(ReqwestExecutor { client })
    }
}

fn to_reqwest_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Patch => Method::PATCH,
    }
}

fn to_header_map(headers: &Headers) -> Result<HeaderMap, RestCollectorError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| RestCollectorError::Config(format!("invalid header name {name:?}: {err}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|err| RestCollectorError::Config(format!("invalid value for header {name}: {err}")))?;
        map.append(name, value);
    }
    Ok(map)
}

/// Flatten a query object into `(name, value)` pairs.
///
/// Arrays repeat the name once per element and `null` is dropped. Anything
/// other than an object yields no pairs.
fn query_pairs(query: &Value) -> Vec<(String, String)> {
    let Value::Object(fields) = query else {
        debug!("ignoring non-object query");
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (name, value) in fields {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar).map(|item| (name.clone(), item)));
            }
            other => {
                if let Some(item) = scalar(other) {
                    pairs.push((name.clone(), item));
                }
            }
        }
    }
    pairs
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// JSON when it parses, the raw text otherwise, `null` when empty.
fn parse_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}
