//! Configuration management for the importer
//!
//! Handles configuration loading (TOML), environment overrides, and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transport::FetchOptions;
use crate::utils::{env_int, env_opt};

/// Default npm-compatible CDN (manifests and files)
pub const DEFAULT_NPM_CDN: &str = "https://cdn.jsdelivr.net/npm";
/// Default npm registry API (manifest fallback)
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";
/// Default Yarn registry
pub const DEFAULT_YARN_REGISTRY: &str = "https://registry.yarnpkg.com";
/// Default raw GitHub content host
pub const DEFAULT_GITHUB_RAW: &str = "https://raw.githubusercontent.com";
/// Default number of dependencies fetched concurrently per group
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

/// Registry base URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// npm-compatible CDN serving `{name}@{version}/{path}`
    #[serde(default = "default_npm_cdn")]
    pub npm_cdn: String,

    /// npm registry API serving `{name}/{version}` manifests
    #[serde(default = "default_npm_registry")]
    pub npm_registry: String,

    /// Yarn registry serving `{name}/{version}` manifests
    #[serde(default = "default_yarn_registry")]
    pub yarn_registry: String,

    /// Dedicated Yarn file CDN; files fall back to `npm_cdn` when unset
    #[serde(default)]
    pub yarn_cdn: Option<String>,

    /// Raw GitHub content host
    #[serde(default = "default_github_raw")]
    pub github_raw: String,
}

fn default_npm_cdn() -> String {
    DEFAULT_NPM_CDN.to_string()
}

fn default_npm_registry() -> String {
    DEFAULT_NPM_REGISTRY.to_string()
}

fn default_yarn_registry() -> String {
    DEFAULT_YARN_REGISTRY.to_string()
}

fn default_github_raw() -> String {
    DEFAULT_GITHUB_RAW.to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            npm_cdn: default_npm_cdn(),
            npm_registry: default_npm_registry(),
            yarn_registry: default_yarn_registry(),
            yarn_cdn: None,
            github_raw: default_github_raw(),
        }
    }
}

/// Per-request timeout and retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Timeout per request in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound on the retry delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Delay multiplier applied after each retry
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

fn default_timeout_ms() -> u64 {
    crate::utils::DEFAULT_NETWORK_TIMEOUT.as_millis() as u64
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl TransportConfig {
    /// Convert to the options the transport client consumes
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_millis(self.timeout_ms),
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "pkg_importer=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

/// Importer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterConfig {
    /// Registry base URLs
    #[serde(default)]
    pub registries: RegistryConfig,

    /// Request timeout and retry policy
    #[serde(default)]
    pub transport: TransportConfig,

    /// Maximum dependencies resolved concurrently within one group
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Root under which virtual module storage paths are reported
    #[serde(default = "default_virtual_root")]
    pub virtual_root: PathBuf,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

fn default_virtual_root() -> PathBuf {
    PathBuf::from("virtual_modules")
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            registries: RegistryConfig::default(),
            transport: TransportConfig::default(),
            max_concurrency: default_max_concurrency(),
            virtual_root: default_virtual_root(),
            logging: None,
        }
    }
}

impl ImporterConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ImporterConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment overrides
    ///
    /// `YARN_REGISTRY` follows the convention of yarn's own tooling.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_opt("NPM_CDN") {
            self.registries.npm_cdn = v;
        }
        if let Some(v) = env_opt("NPM_REGISTRY") {
            self.registries.npm_registry = v;
        }
        if let Some(v) = env_opt("YARN_REGISTRY") {
            self.registries.yarn_registry = v;
        }
        if let Some(v) = env_opt("YARN_CDN") {
            self.registries.yarn_cdn = Some(v);
        }
        if let Some(v) = env_opt("GITHUB_RAW") {
            self.registries.github_raw = v;
        }
        if let Some(v) = env_int::<usize>("PKG_IMPORTER_MAX_CONCURRENCY") {
            self.max_concurrency = v;
        }
        if let Some(v) = env_int::<u64>("PKG_IMPORTER_TIMEOUT_MS") {
            self.transport.timeout_ms = v;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_concurrency == 0 {
            return Err(anyhow::anyhow!("max_concurrency must be greater than 0"));
        }
        if self.transport.max_retries == 0 {
            return Err(anyhow::anyhow!(
                "transport.max_retries must be at least 1 (it counts the first attempt)"
            ));
        }
        if !self.transport.backoff_factor.is_finite() || self.transport.backoff_factor < 1.0 {
            return Err(anyhow::anyhow!(
                "transport.backoff_factor must be a finite number >= 1.0, got {}",
                self.transport.backoff_factor
            ));
        }
        if self.transport.initial_delay_ms > self.transport.max_delay_ms {
            return Err(anyhow::anyhow!(
                "transport.initial_delay_ms ({}) exceeds transport.max_delay_ms ({})",
                self.transport.initial_delay_ms,
                self.transport.max_delay_ms
            ));
        }
        for (field, url) in [
            ("npm_cdn", &self.registries.npm_cdn),
            ("npm_registry", &self.registries.npm_registry),
            ("yarn_registry", &self.registries.yarn_registry),
            ("github_raw", &self.registries.github_raw),
        ] {
            let parsed = url::Url::parse(url)
                .map_err(|e| anyhow::anyhow!("registries.{} is not a valid URL ({}): {}", field, url, e))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(anyhow::anyhow!(
                    "registries.{} must be an http(s) URL, got {:?}",
                    field,
                    url
                ));
            }
        }
        Ok(())
    }
}
