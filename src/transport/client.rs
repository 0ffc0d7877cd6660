//! Single-attempt HTTP GET
//!
//! `HttpClient` is the low-level seam: one request, fully buffered body, no
//! retries and no timeout policy (both live in `TransportClient`).

use async_trait::async_trait;

use crate::error::{ImportError, ImportResult, STATUS_TIMEOUT, STATUS_TRANSPORT};

/// Fully read HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx or 3xx
    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// One GET request
///
/// Implementations report socket-level failures as
/// `ImportError::Network { status: 0, .. }`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> ImportResult<HttpResponse>;
}

#[cfg(feature = "http-client")]
pub use reqwest_client::ReqwestHttpClient;

#[cfg(feature = "http-client")]
mod reqwest_client {
    use super::*;
    use reqwest::Client;
    use tracing::debug;

    /// reqwest-backed client
    #[derive(Debug, Clone)]
    pub struct ReqwestHttpClient {
        client: Client,
    }

    impl ReqwestHttpClient {
        pub fn new() -> Self {
            let client = Client::builder()
                .user_agent(concat!("pkg-importer/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new());
            Self { client }
        }
    }

    impl Default for ReqwestHttpClient {
        fn default() -> Self {
            Self::new()
        }
    }

    fn transport_error(url: &str, e: &reqwest::Error) -> ImportError {
        debug!("Request to {} failed: {}", url, e);
        let status = if e.is_timeout() {
            STATUS_TIMEOUT
        } else {
            e.status().map(|s| s.as_u16()).unwrap_or(STATUS_TRANSPORT)
        };
        ImportError::Network {
            status,
            url: url.to_string(),
        }
    }

    #[async_trait]
    impl HttpClient for ReqwestHttpClient {
        async fn get(&self, url: &str) -> ImportResult<HttpResponse> {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| transport_error(url, &e))?;
            let status = response.status().as_u16();
            // Buffer the whole body; callers never see partial reads.
            let body = response
                .text()
                .await
                .map_err(|e| transport_error(url, &e))?;
            Ok(HttpResponse { status, body })
        }
    }
}
