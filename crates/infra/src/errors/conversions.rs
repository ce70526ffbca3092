//! Conversions from external infrastructure errors into domain errors.

use reqwest::Error as HttpError;
use restcollector_domain::{RestCollectorError, TransportError};

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub RestCollectorError);

impl From<InfraError> for RestCollectorError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<RestCollectorError> for InfraError {
    fn from(value: RestCollectorError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoTransportError {
    fn into_transport(self) -> TransportError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportError */
/* -------------------------------------------------------------------------- */

impl IntoTransportError for HttpError {
    fn into_transport(self) -> TransportError {
        if self.is_timeout() {
            return TransportError::timeout(format!("HTTP request timed out: {self}"));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return TransportError::new(format!("HTTP connection failure: {self}"));
        }

        if self.is_body() || self.is_decode() {
            return TransportError::new(format!("HTTP body failure: {self}"));
        }

        if self.is_builder() {
            return TransportError::new(format!("malformed HTTP request: {self}"));
        }

        TransportError::new(self.to_string())
    }
}

/// Map a failed exchange onto the port's transport failure.
pub fn transport_error(err: HttpError) -> TransportError {
    err.into_transport()
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → RestCollectorError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_builder() {
            return InfraError(RestCollectorError::Config(format!(
                "failed to build HTTP client: {value}"
            )));
        }
        InfraError(RestCollectorError::Internal(value.into_transport().message))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
