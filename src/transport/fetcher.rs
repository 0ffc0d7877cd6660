//! Transport client: timeout, retry and exponential backoff over `HttpClient`

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ImportError, ImportResult, STATUS_TIMEOUT};
use crate::transport::client::HttpClient;
use crate::transport::FetchOptions;
use crate::utils::{retry_if_retryable, with_custom_timeout};

/// Fetches text and JSON with the configured retry policy
#[derive(Clone)]
pub struct TransportClient {
    http: Arc<dyn HttpClient>,
    defaults: FetchOptions,
}

impl TransportClient {
    pub fn new(http: Arc<dyn HttpClient>, defaults: FetchOptions) -> Self {
        Self { http, defaults }
    }

    /// Options used by `get_text`/`get_json`
    pub fn defaults(&self) -> &FetchOptions {
        &self.defaults
    }

    /// Fetch a URL as text
    ///
    /// Non-2xx/3xx statuses, socket errors (status 0) and timeouts (status 408)
    /// are retried. The final failure carries the last observed status.
    pub async fn fetch_text(&self, url: &str, options: &FetchOptions) -> ImportResult<String> {
        let retry = options.retry_config();
        retry_if_retryable(&retry, || self.attempt(url, options)).await
    }

    /// Fetch a URL and parse it as JSON
    ///
    /// A body that is not valid JSON fails with `InvalidResponse` and is not retried.
    pub async fn fetch_json(&self, url: &str, options: &FetchOptions) -> ImportResult<Value> {
        let text = self.fetch_text(url, options).await?;
        serde_json::from_str(&text).map_err(|e| ImportError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// `fetch_text` with the client defaults
    pub async fn get_text(&self, url: &str) -> ImportResult<String> {
        self.fetch_text(url, &self.defaults).await
    }

    /// `fetch_json` with the client defaults
    pub async fn get_json(&self, url: &str) -> ImportResult<Value> {
        self.fetch_json(url, &self.defaults).await
    }

    async fn attempt(&self, url: &str, options: &FetchOptions) -> ImportResult<String> {
        debug!("GET {}", url);
        match with_custom_timeout(self.http.get(url), options.timeout).await {
            Err(_) => Err(ImportError::Network {
                status: STATUS_TIMEOUT,
                url: url.to_string(),
            }),
            Ok(Err(e)) => Err(e),
            Ok(Ok(response)) if !response.is_success() => Err(ImportError::Network {
                status: response.status,
                url: url.to_string(),
            }),
            Ok(Ok(response)) => Ok(response.body),
        }
    }
}

impl std::fmt::Debug for TransportClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportClient")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}
