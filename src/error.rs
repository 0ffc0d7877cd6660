//! Importer error types
//!
//! Every failure the importer can surface. Only `Network` is retried; the
//! orchestrator converts the rest into per-package outcomes.

use thiserror::Error;

use crate::utils::retry::IsRetryable;

/// HTTP status reported for transport-level failures (socket, DNS, TLS)
pub const STATUS_TRANSPORT: u16 = 0;

/// HTTP status reported when a request exceeds its timeout
pub const STATUS_TIMEOUT: u16 = 408;

/// Importer errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("Network error {status} fetching {url}")]
    Network { status: u16, url: String },

    #[error("Invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    #[error("Failed to compile module {module}: {reason}")]
    Compile { module: String, reason: String },

    #[error("Dependency {dependency} of {parent} failed: {reason}")]
    DependencyFailure {
        parent: String,
        dependency: String,
        reason: String,
    },

    #[error("Manifest unavailable for {name}: {reason}")]
    ManifestMissing { name: String, reason: String },

    #[error("Invalid package specifier: {0}")]
    InvalidSpecifier(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ImportError {
    /// Status code carried by a network error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ImportError::Network { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl IsRetryable for ImportError {
    fn is_retryable(&self) -> bool {
        matches!(self, ImportError::Network { .. })
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
