//! Package importer
//!
//! - `Importer`: batch import, dependency resolution and registry bookkeeping
//! - `ImportContext`: resolution states, in-flight set and manifest cache
//! - `BatchReport`: per-package outcomes and cycle warnings

pub mod context;
mod github;
pub mod report;
pub mod resolver;

pub use context::{BeginResolution, ImportContext, ResolutionState};
pub use report::{BatchReport, ConcurrentSkip, CycleWarning, ImportOutcome, LoadedModule};
pub use resolver::{ImportOptions, Importer};
