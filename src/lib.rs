//! pkg-importer - runtime package importer
//!
//! Fetches packages from npm, Yarn and GitHub at runtime and loads them into
//! an in-process virtual module registry, without an install step.
//!
//! ## Layers
//!
//! 1. `package`: specifier parsing, manifests, registry URLs
//! 2. `transport`: HTTP GET with timeout, retry and backoff
//! 3. `module`: compiler seam, loader, virtual module registry, resolver chain
//! 4. `importer`: dependency resolution and batch reports
//!
//! ## Example
//!
//! ```no_run
//! # async fn run() -> pkg_importer::ImportResult<()> {
//! use pkg_importer::{Importer, ImporterConfig};
//!
//! let importer = Importer::from_config(ImporterConfig::from_env())?;
//! let report = importer.import_batch(&["lodash@^4.17.21", "github:owner/repo"]).await;
//! for failure in &report.failed {
//!     eprintln!("{}: {:?}", failure.name, failure.error_message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod importer;
pub mod module;
pub mod package;
pub mod transport;
pub mod utils;

pub use config::{ImporterConfig, LoggingConfig, RegistryConfig, TransportConfig};
pub use error::{ImportError, ImportResult};
pub use importer::{
    BatchReport, ConcurrentSkip, CycleWarning, ImportOptions, ImportOutcome, Importer, LoadedModule,
    ResolutionState,
};
pub use module::{
    BuiltinResolver, FallbackResolver, ModuleCompiler, Resolution, ScriptCompiler,
    VirtualModuleRecord, VirtualModuleRegistry,
};
pub use package::{PackageManifest, PackageSource, PackageSpecifier};
pub use transport::{FetchOptions, HttpClient, HttpResponse, TransportClient};
