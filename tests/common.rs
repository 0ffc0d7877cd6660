//! Shared test helpers: scripted HTTP client and registry fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use pkg_importer::config::{ImporterConfig, RegistryConfig};
use pkg_importer::error::{ImportError, ImportResult};
use pkg_importer::transport::{HttpClient, HttpResponse};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const NPM_CDN: &str = "https://cdn.test/npm";
pub const NPM_REGISTRY: &str = "https://registry.test";
pub const YARN_REGISTRY: &str = "https://yarn.test";
pub const GITHUB_RAW: &str = "https://raw.test";

/// HTTP client that serves scripted responses per URL
///
/// A URL scripted with several responses serves them in order and then keeps
/// repeating the last one. Unscripted URLs answer 404. Status 0 is served as
/// a transport error.
#[derive(Default)]
pub struct MockHttpClient {
    routes: Mutex<HashMap<String, VecDeque<HttpResponse>>>,
    hits: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, so concurrent requests overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(&self, url: impl Into<String>, status: u16, body: impl Into<String>) {
        self.respond_sequence(url, vec![HttpResponse::new(status, body)]);
    }

    pub fn respond_json(&self, url: impl Into<String>, doc: &Value) {
        self.respond(url, 200, doc.to_string());
    }

    pub fn respond_sequence(&self, url: impl Into<String>, responses: Vec<HttpResponse>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.into(), responses.into_iter().collect());
    }

    /// Requests seen for `url`
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }

    /// Highest number of requests in progress at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn next_response(&self, url: &str) -> HttpResponse {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| HttpResponse::new(404, "")),
            None => HttpResponse::new(404, "Not Found"),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str) -> ImportResult<HttpResponse> {
        *self.hits.lock().unwrap().entry(url.to_string()).or_insert(0) += 1;
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.next_response(url);
        self.active.fetch_sub(1, Ordering::SeqCst);

        if response.status == 0 {
            return Err(ImportError::Network {
                status: 0,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// Config pointing at the fixture hosts, one attempt per request
pub fn test_config() -> ImporterConfig {
    let mut config = ImporterConfig::default();
    config.registries = RegistryConfig {
        npm_cdn: NPM_CDN.to_string(),
        npm_registry: NPM_REGISTRY.to_string(),
        yarn_registry: YARN_REGISTRY.to_string(),
        yarn_cdn: None,
        github_raw: GITHUB_RAW.to_string(),
    };
    config.transport.max_retries = 1;
    config.transport.initial_delay_ms = 1;
    config.transport.max_delay_ms = 5;
    config.transport.timeout_ms = 2_000;
    config
}

pub fn cdn_manifest_url(name: &str, version: &str) -> String {
    format!("{}/{}@{}/package.json", NPM_CDN, name, version)
}

pub fn cdn_file_url(name: &str, version: &str, path: &str) -> String {
    format!("{}/{}@{}/{}", NPM_CDN, name, version, path)
}

pub fn registry_api_url(name: &str, version: &str) -> String {
    format!("{}/{}/{}", NPM_REGISTRY, name, version)
}

pub fn github_url(owner: &str, repo: &str, branch: &str, path: &str) -> String {
    format!("{}/{}/{}/{}/{}", GITHUB_RAW, owner, repo, branch, path)
}

/// Script an npm package on the CDN: manifest plus `index.js`
pub fn publish(client: &MockHttpClient, name: &str, version: &str, deps: &[(&str, &str)]) {
    let dependencies: serde_json::Map<String, Value> = deps
        .iter()
        .map(|(n, v)| (n.to_string(), Value::String(v.to_string())))
        .collect();
    client.respond_json(
        cdn_manifest_url(name, version),
        &json!({
            "name": name,
            "version": version,
            "main": "index.js",
            "dependencies": dependencies,
        }),
    );
    let body: String = deps
        .iter()
        .map(|(n, _)| format!("const _{} = require('{}');\n", n.len(), n))
        .chain(std::iter::once(format!("module.exports = '{}';\n", name)))
        .collect();
    client.respond(cdn_file_url(name, version, "index.js"), 200, body);
}
