//! Integration tests for resilience module
//!
//! Exercises the retry wrapper the way the request engine uses it: a shared
//! configuration, an observer recording attempts, and operations that fail
//! with a status-bearing error.

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use restcollector_common::resilience::{retry_with_config, RetryConfig, RetryExecutor};

/// Custom error type for testing
#[derive(Debug, Clone, PartialEq)]
struct StatusError {
    status: u16,
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "request failed with status {}", self.status)
    }
}

impl std::error::Error for StatusError {}

/// Validates recovery with exponential backoff.
///
/// # Test Steps
/// 1. Configure 4 retries, exponential backoff starting at 5ms
/// 2. Fail the first 2 attempts
/// 3. Confirm the third attempt's value is returned
/// 4. Confirm the wrapper slept at least 5ms + 10ms
#[tokio::test(flavor = "multi_thread")]
async fn test_retry_exponential_backoff_success() {
    let attempt_count = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&attempt_count);

    let config = RetryConfig::<StatusError>::builder()
        .retries(4)
        .exponential_backoff(Duration::from_millis(5), 2.0, Some(Duration::from_millis(50)))
        .no_jitter()
        .build()
        .expect("Failed to build config");

    let started = Instant::now();
    let result = retry_with_config(&config, || {
        let counter = Arc::clone(&counter);
        async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StatusError { status: 503 })
            } else {
                Ok("Success")
            }
        }
    })
    .await;

    assert_eq!(result.expect("Should succeed"), "Success");
    assert_eq!(attempt_count.load(Ordering::SeqCst), 3);
    assert!(started.elapsed() >= Duration::from_millis(15));
}

/// Validates the bookkeeping callers rely on when an endpoint always fails.
///
/// With one retry the observer fires twice: attempt 1 with one retry left,
/// then attempt 2 with none left. The final error keeps the endpoint status.
#[tokio::test]
async fn test_retry_exhaustion_reports_each_attempt() {
    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);

    let config = RetryConfig::<StatusError>::builder()
        .retries(1)
        .fixed_backoff(Duration::from_millis(1))
        .on_failed_attempt(move |failed| {
            sink.lock().expect("observer lock").push((failed.attempt_number, failed.retries_left));
        })
        .build()
        .expect("Failed to build config");

    let outcome = RetryExecutor::new(config)
        .execute_with_outcome(|| async { Err::<(), _>(StatusError { status: 500 }) })
        .await;

    assert_eq!(outcome.attempts, 2);
    assert_eq!(outcome.result, Err(StatusError { status: 500 }));
    assert_eq!(*observed.lock().expect("observer lock"), vec![(1, 1), (2, 0)]);
}

/// A cloned configuration shares its observer, so one policy value can be
/// attached to several operations and still report to the same sink.
#[tokio::test]
async fn test_cloned_config_shares_observer() {
    let failures = Arc::new(AtomicU32::new(0));
    let sink = Arc::clone(&failures);

    let config = RetryConfig::<StatusError>::builder()
        .retries(2)
        .fixed_backoff(Duration::ZERO)
        .on_failed_attempt(move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .expect("Failed to build config");
    let cloned = config.clone();

    let first: Result<(), StatusError> =
        retry_with_config(&config, || async { Err(StatusError { status: 502 }) }).await;
    let second: Result<(), StatusError> =
        retry_with_config(&cloned, || async { Err(StatusError { status: 502 }) }).await;

    assert!(first.is_err());
    assert!(second.is_err());
    assert_eq!(failures.load(Ordering::SeqCst), 6);
}
