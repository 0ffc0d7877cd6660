//! Retry utilities for registry fetches
//!
//! Provides retry logic with exponential backoff for transient failures.

use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts (the first try counts)
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay to wait after `retry_index` failed attempts (0-based)
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 0..retry_index {
            delay = next_delay(delay, self);
        }
        delay
    }
}

/// Scale `delay` by the multiplier, capped at `max_delay`
///
/// A product that is not a valid `Duration` (overflow, NaN, negative) yields `max_delay`.
fn next_delay(delay: Duration, config: &RetryConfig) -> Duration {
    let scaled = delay.as_secs_f64() * config.backoff_multiplier;
    Duration::try_from_secs_f64(scaled).map_or(config.max_delay, |d| d.min(config.max_delay))
}

/// Check if an error is retryable (transient failure)
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Retry only if error is retryable
///
/// Non-retryable errors are returned immediately. After `max_attempts`
/// failures the last error is returned.
pub async fn retry_if_retryable<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_attempts.max(1);
    let mut delay = std::cmp::min(config.initial_delay, config.max_delay);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !e.is_retryable() || attempt >= max_attempts {
                    return Err(e);
                }
                tracing::debug!(
                    "Retryable error (attempt {}/{}): {}. Retrying in {:?}...",
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                sleep(delay).await;
                delay = next_delay(delay, config);
            }
        }
    }
}
