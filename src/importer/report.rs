//! Batch import reports

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

/// Per-package result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub name: String,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ImportOutcome {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            error_message: None,
        }
    }

    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// A dependency branch skipped because its package was already resolving
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWarning {
    /// Package that was skipped
    pub name: String,
    /// Package whose dependency list named it
    pub requested_by: Option<String>,
}

impl fmt::Display for CycleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requested_by {
            Some(parent) => write!(
                f,
                "circular dependency: {} (required by {}) is already resolving, branch skipped",
                self.name, parent
            ),
            None => write!(f, "circular dependency: {} is already resolving, skipped", self.name),
        }
    }
}

/// A dependency branch skipped because a sibling branch was already resolving it
///
/// Not a cycle: the package is still loaded by the other branch, but the
/// requester finished without waiting for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrentSkip {
    pub name: String,
    pub requested_by: Option<String>,
}

impl fmt::Display for ConcurrentSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.requested_by {
            Some(parent) => write!(
                f,
                "{} (required by {}) is being resolved by another branch, not awaited",
                self.name, parent
            ),
            None => write!(f, "{} is being resolved by another branch, not awaited", self.name),
        }
    }
}

/// Aggregated result of one `import_batch` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: Vec<ImportOutcome>,
    pub failed: Vec<ImportOutcome>,
    pub warnings: Vec<CycleWarning>,
    #[serde(default)]
    pub concurrent_skips: Vec<ConcurrentSkip>,
}

impl BatchReport {
    /// No failures
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded_names(&self) -> Vec<&str> {
        self.succeeded.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn outcome(&self, name: &str) -> Option<&ImportOutcome> {
        self.succeeded
            .iter()
            .chain(self.failed.iter())
            .find(|o| o.name == name)
    }
}

/// Listing entry for `Importer::list_loaded`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedModule {
    pub name: String,
    pub storage_path: PathBuf,
    pub is_loaded: bool,
}

/// Collects outcomes while a batch runs; each name is reported once
#[derive(Debug, Default)]
pub(crate) struct BatchCollector {
    report: Mutex<BatchReport>,
}

impl BatchCollector {
    fn with_report<R>(&self, f: impl FnOnce(&mut BatchReport) -> R) -> R {
        let mut report = self.report.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut report)
    }

    pub fn record(&self, outcome: ImportOutcome) {
        self.with_report(|report| {
            if report.outcome(&outcome.name).is_some() {
                return;
            }
            if outcome.success {
                report.succeeded.push(outcome);
            } else {
                report.failed.push(outcome);
            }
        });
    }

    pub fn has_outcome(&self, name: &str) -> bool {
        self.with_report(|report| report.outcome(name).is_some())
    }

    pub fn warn(&self, warning: CycleWarning) {
        self.with_report(|report| report.warnings.push(warning));
    }

    pub fn skip(&self, skip: ConcurrentSkip) {
        self.with_report(|report| report.concurrent_skips.push(skip));
    }

    pub fn finish(self) -> BatchReport {
        self.report.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
