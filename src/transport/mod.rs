//! HTTP transport for registry, CDN and GitHub fetches
//!
//! - `HttpClient`: one GET, buffered body (reqwest implementation behind `http-client`)
//! - `TransportClient`: per-request timeout, retry with exponential backoff, JSON parsing

pub mod client;
pub mod fetcher;

use std::time::Duration;

use crate::utils::RetryConfig;

pub use client::{HttpClient, HttpResponse};
#[cfg(feature = "http-client")]
pub use client::ReqwestHttpClient;
pub use fetcher::TransportClient;

/// Timeout and retry policy for one fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Timeout for each individual attempt
    pub timeout: Duration,
    /// Total attempts before giving up
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on the retry delay
    pub max_delay: Duration,
    /// Delay multiplier applied after each retry
    pub backoff_factor: f64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        crate::config::TransportConfig::default().fetch_options()
    }
}

impl FetchOptions {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retries,
            initial_delay: self.initial_delay,
            max_delay: self.max_delay,
            backoff_multiplier: self.backoff_factor,
        }
    }
}
