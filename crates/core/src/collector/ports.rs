//! Port interfaces for the merge-fetch engine

use async_trait::async_trait;
use restcollector_domain::{Headers, OutgoingRequest, RestResponse, TransportError};

/// Performs one network request.
///
/// Any response that arrives, whatever its status, is returned as `Ok`.
/// `Err` is reserved for requests that produced no response at all
/// (connection failure, timeout, malformed request).
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: OutgoingRequest) -> Result<RestResponse, TransportError>;
}

/// Adds caller-specific headers to every outgoing request.
///
/// Invoked once per network call (primary and each mapper) with a fresh
/// header bag and the bag supplied with the top-level request.
pub trait DecorateRequest<B>: Send + Sync {
    fn decorate_request(&self, headers: &mut Headers, bag: Option<&B>);
}

impl<B, F> DecorateRequest<B> for F
where
    F: Fn(&mut Headers, Option<&B>) + Send + Sync,
{
    fn decorate_request(&self, headers: &mut Headers, bag: Option<&B>) {
        self(headers, bag);
    }
}
