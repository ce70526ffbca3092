//! Error types used throughout the workspace

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Main error type for RestCollector
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum RestCollectorError {
    /// A primary or mapper request failed at the HTTP or transport layer.
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RestCollectorError {
    /// Status of the failed request, if this error came from one.
    pub fn status(&self) -> Option<&RequestStatus> {
        match self {
            Self::Request(err) => Some(&err.status),
            _ => None,
        }
    }

    /// The underlying request error, if any.
    pub fn as_request(&self) -> Option<&RequestError> {
        match self {
            Self::Request(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for RestCollector operations
pub type Result<T> = std::result::Result<T, RestCollectorError>;

/// Outcome recorded on a failed request.
///
/// Upstream failures carry the HTTP status code. When no response was
/// obtained at all the stringified transport failure takes its place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestStatus {
    Http(u16),
    Transport(String),
}

impl RequestStatus {
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Http(code) => Some(*code),
            Self::Transport(_) => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{code}"),
            Self::Transport(message) => f.write_str(message),
        }
    }
}

impl PartialEq<u16> for RequestStatus {
    fn eq(&self, other: &u16) -> bool {
        self.code() == Some(*other)
    }
}

/// Failure of a single outgoing request, primary or mapper.
///
/// Constructed the same way for HTTP failures (status >= 300) and transport
/// failures so callers can inspect `status`, `url`, `query` and `data`
/// without caring where the request died.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("Request to {url} failed with status {status}")]
pub struct RequestError {
    pub url: String,
    pub status: RequestStatus,
    /// Response body, or the stringified transport failure.
    pub response: Value,
    /// Query sent with the request.
    pub query: Option<Value>,
    /// Body sent with the request.
    pub data: Option<Value>,
}

impl RequestError {
    /// Build an error from a response that came back with a failing status.
    pub fn http(
        url: impl Into<String>,
        status: u16,
        response: Value,
        query: Option<Value>,
        data: Option<Value>,
    ) -> Self {
        Self { url: url.into(), status: RequestStatus::Http(status), response, query, data }
    }

    /// Build an error for a request that never produced a response.
    pub fn transport(
        url: impl Into<String>,
        failure: &TransportError,
        query: Option<Value>,
        data: Option<Value>,
    ) -> Self {
        let message = failure.to_string();
        Self {
            url: url.into(),
            status: RequestStatus::Transport(message.clone()),
            response: Value::String(message),
            query,
            data,
        }
    }
}

/// Failure reported by an HTTP executor when no response was obtained
/// (connection refused, timeout, malformed request).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
    pub timed_out: bool,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), timed_out: false }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self { message: message.into(), timed_out: true }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn transport_error_fills_status_and_response_with_message() {
        let failure = TransportError::new("connection refused");
        let err = RequestError::transport("http://localhost/api", &failure, None, None);

        assert_eq!(err.status, RequestStatus::Transport("connection refused".into()));
        assert_eq!(err.response, json!("connection refused"));
        assert!(err.status.is_transport());
    }

    #[test]
    fn http_error_exposes_status_code() {
        let err = RequestError::http(
            "http://localhost/api/users",
            500,
            json!({ "error": "boom" }),
            Some(json!({ "id": [3, 4] })),
            None,
        );
        let wrapped: RestCollectorError = err.into();

        assert_eq!(wrapped.status().and_then(RequestStatus::code), Some(500));
        assert!(*wrapped.status().unwrap() == 500);
        assert_eq!(wrapped.to_string(), "Request to http://localhost/api/users failed with status 500");
    }

    #[test]
    fn non_request_errors_have_no_status() {
        let err = RestCollectorError::InvalidInput("no url".into());
        assert!(err.status().is_none());
        assert!(err.as_request().is_none());
    }

    #[test]
    fn errors_serialize_with_type_tag() {
        let err = RestCollectorError::Config("missing timeout".into());
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, json!({ "type": "Config", "detail": "missing timeout" }));
    }
}
