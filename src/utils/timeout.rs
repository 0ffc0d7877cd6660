//! Timeout utilities for network requests
//!
//! The importer bounds latency per request only; there is no batch-wide deadline.

use std::time::Duration;
use tokio::time::timeout;

/// Default timeout for a single registry/CDN request
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(30);

/// Execute operation with custom timeout
pub async fn with_custom_timeout<F, T>(
    operation: F,
    duration: Duration,
) -> Result<T, tokio::time::error::Elapsed>
where
    F: std::future::Future<Output = T>,
{
    timeout(duration, operation).await
}
