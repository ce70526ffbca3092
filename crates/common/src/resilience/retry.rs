//! Generic retry wrapper for fallible async operations
//!
//! Invokes an operation until it succeeds or the configured number of retries
//! is used up. Between attempts the wrapper sleeps according to a
//! [`BackoffStrategy`] adjusted by [`Jitter`]. An optional observer is told
//! about every failed attempt, including the final one.
//!
//! Unlike a wrapper that reports "attempts exhausted", the error returned
//! after the last attempt is the operation's own error, unchanged.
//!
//! The wrapper performs no deduplication of side effects between attempts:
//! only wrap operations that are safe to repeat.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Errors raised while building a retry configuration
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryConfigError {
    #[error("Invalid retry configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: initial_delay + (retry * increment)
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: initial_delay * base^retry, optionally capped
    Exponential { initial_delay: Duration, base: f64, max_delay: Option<Duration> },
    /// Custom backoff function
    Custom(fn(u32) -> Duration),
}

impl BackoffStrategy {
    /// Delay before retry number `retry` (0-based: the delay after the first
    /// failure is `calculate_delay(0)`).
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(retry))
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
                let mut delay_ms = initial_delay.as_millis() as f64 * base.powi(exponent);
                if let Some(max_delay) = max_delay {
                    delay_ms = delay_ms.min(max_delay.as_millis() as f64);
                }
                // float-to-int casts saturate, so overflow lands on u64::MAX
                Duration::from_millis(delay_ms as u64)
            }
            BackoffStrategy::Custom(f) => f(retry),
        }
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
    /// Multiply the delay by a random factor in [1, 2)
    Randomize,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(&self, delay: Duration) -> Duration {
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        if delay_ms == 0 {
            return delay;
        }

        let mut rng = rand::thread_rng();
        match self {
            Jitter::None => delay,
            Jitter::Full => Duration::from_millis(rng.gen_range(0..=delay_ms)),
            Jitter::Equal => {
                let half = delay_ms / 2;
                Duration::from_millis(half + rng.gen_range(0..=half))
            }
            Jitter::Randomize => {
                let factor: f64 = rng.gen_range(1.0..2.0);
                Duration::from_millis((delay_ms as f64 * factor) as u64)
            }
        }
    }
}

/// Details handed to the failed-attempt observer.
#[derive(Debug)]
pub struct FailedAttempt<'a, E> {
    /// The error produced by this attempt.
    pub error: &'a E,
    /// 1-based number of the attempt that failed.
    pub attempt_number: u32,
    /// Retries still available after this attempt.
    pub retries_left: u32,
}

/// Callback invoked after every failed attempt.
pub type AttemptObserver<E> = Arc<dyn Fn(&FailedAttempt<'_, E>) + Send + Sync>;

/// Configuration for retry behavior
pub struct RetryConfig<E> {
    /// Number of retries after the first attempt (total attempts = retries + 1)
    pub retries: u32,
    /// Backoff strategy for calculating delays
    pub backoff: BackoffStrategy,
    /// Jitter type for randomizing delays
    pub jitter: Jitter,
    /// Stop retrying once the next delay would exceed this budget
    pub max_total_time: Option<Duration>,
    on_failed_attempt: Option<AttemptObserver<E>>,
}

impl<E> Clone for RetryConfig<E> {
    fn clone(&self) -> Self {
        Self {
            retries: self.retries,
            backoff: self.backoff.clone(),
            jitter: self.jitter,
            max_total_time: self.max_total_time,
            on_failed_attempt: self.on_failed_attempt.clone(),
        }
    }
}

impl<E> fmt::Debug for RetryConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryConfig")
            .field("retries", &self.retries)
            .field("backoff", &self.backoff)
            .field("jitter", &self.jitter)
            .field("max_total_time", &self.max_total_time)
            .field("on_failed_attempt", &self.on_failed_attempt.is_some())
            .finish()
    }
}

impl<E> Default for RetryConfig<E> {
    fn default() -> Self {
        Self {
            retries: 10,
            backoff: BackoffStrategy::Exponential {
                initial_delay: Duration::from_millis(1_000),
                base: 2.0,
                max_delay: None,
            },
            jitter: Jitter::None,
            max_total_time: None,
            on_failed_attempt: None,
        }
    }
}

impl<E> RetryConfig<E> {
    /// Create a configuration builder
    pub fn builder() -> RetryConfigBuilder<E> {
        RetryConfigBuilder::new()
    }

    /// Total attempts this configuration allows.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RetryConfigError> {
        match &self.backoff {
            BackoffStrategy::Exponential { base, .. } if *base <= 0.0 => {
                Err(RetryConfigError::InvalidConfiguration {
                    message: "exponential base must be greater than 0".to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    fn notify(&self, attempt: &FailedAttempt<'_, E>) {
        if let Some(observer) = &self.on_failed_attempt {
            observer(attempt);
        }
    }
}

/// Builder for RetryConfig with fluent API
pub struct RetryConfigBuilder<E> {
    config: RetryConfig<E>,
}

impl<E> Default for RetryConfigBuilder<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> RetryConfigBuilder<E> {
    pub fn new() -> Self {
        Self { config: RetryConfig::default() }
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Fixed(delay);
        self
    }

    pub fn linear_backoff(mut self, initial_delay: Duration, increment: Duration) -> Self {
        self.config.backoff = BackoffStrategy::Linear { initial_delay, increment };
        self
    }

    pub fn exponential_backoff(
        mut self,
        initial_delay: Duration,
        base: f64,
        max_delay: Option<Duration>,
    ) -> Self {
        self.config.backoff = BackoffStrategy::Exponential { initial_delay, base, max_delay };
        self
    }

    pub fn custom_backoff(mut self, f: fn(u32) -> Duration) -> Self {
        self.config.backoff = BackoffStrategy::Custom(f);
        self
    }

    pub fn no_jitter(mut self) -> Self {
        self.config.jitter = Jitter::None;
        self
    }

    pub fn full_jitter(mut self) -> Self {
        self.config.jitter = Jitter::Full;
        self
    }

    pub fn equal_jitter(mut self) -> Self {
        self.config.jitter = Jitter::Equal;
        self
    }

    pub fn randomize(mut self) -> Self {
        self.config.jitter = Jitter::Randomize;
        self
    }

    pub fn max_total_time(mut self, duration: Duration) -> Self {
        self.config.max_total_time = Some(duration);
        self
    }

    /// Observe every failed attempt, including the last one.
    pub fn on_failed_attempt<F>(mut self, observer: F) -> Self
    where
        F: Fn(&FailedAttempt<'_, E>) + Send + Sync + 'static,
    {
        self.config.on_failed_attempt = Some(Arc::new(observer));
        self
    }

    pub fn build(self) -> Result<RetryConfig<E>, RetryConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Outcome of a retry execution including result and summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, E>,
    pub attempts: u32,
    pub total_delay: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Runs operations under a [`RetryConfig`].
pub struct RetryExecutor<E> {
    config: RetryConfig<E>,
}

impl<E> RetryExecutor<E>
where
    E: fmt::Display,
{
    pub fn new(config: RetryConfig<E>) -> Self {
        Self { config }
    }

    /// Execute an operation with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// Execute an operation with retry logic and return outcome statistics.
    #[instrument(skip(self, operation), fields(retries = self.config.retries))]
    pub async fn execute_with_outcome<F, Fut, T>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = self.config.max_attempts();
        let started = Instant::now();
        let mut total_delay = Duration::ZERO;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("Executing operation (attempt {}/{})", attempt, max_attempts);

            let error = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("Operation succeeded after {} retries", attempt - 1);
                    }
                    return RetryOutcome { result: Ok(value), attempts: attempt, total_delay };
                }
                Err(error) => error,
            };

            let retries_left = max_attempts - attempt;
            self.config.notify(&FailedAttempt { error: &error, attempt_number: attempt, retries_left });

            if retries_left == 0 {
                warn!("All retry attempts exhausted after {} tries, last error: {}", attempt, error);
                return RetryOutcome { result: Err(error), attempts: attempt, total_delay };
            }

            let delay = self.config.jitter.apply(self.config.backoff.calculate_delay(attempt - 1));

            if let Some(budget) = self.config.max_total_time {
                if started.elapsed().saturating_add(delay) > budget {
                    warn!("Retry budget of {:?} exceeded after {} attempts", budget, attempt);
                    return RetryOutcome { result: Err(error), attempts: attempt, total_delay };
                }
            }

            warn!(
                "Operation failed (attempt {}, {} retries left), retrying after {:?}: {}",
                attempt, retries_left, delay, error
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            total_delay += delay;
        }
    }
}

/// Convenience function: run `operation` under `config`.
pub async fn retry_with_config<F, Fut, T, E>(config: &RetryConfig<E>, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    RetryExecutor::new(config.clone()).execute(operation).await
}
