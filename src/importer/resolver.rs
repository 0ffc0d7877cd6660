//! Dependency-resolving importer
//!
//! Parses specifiers, fetches manifests, resolves declared dependencies in
//! bounded concurrent groups and loads each package's entry file into the
//! virtual module registry.
//!
//! Cycles are broken by skipping: a package already resolving further up the
//! current branch is not loaded again for that branch, and a `CycleWarning`
//! is recorded instead.

use futures::future::{join_all, BoxFuture};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ImporterConfig;
use crate::error::{ImportError, ImportResult};
use crate::importer::context::{BeginResolution, ImportContext, ResolutionState};
use crate::importer::report::{
    BatchCollector, BatchReport, ConcurrentSkip, CycleWarning, ImportOutcome, LoadedModule,
};
use crate::module::loader::{ModuleLoader, ModuleOrigin};
use crate::module::registry::{Resolution, VirtualModuleRegistry};
use crate::module::traits::{FallbackResolver, ModuleCompiler, VirtualModuleRecord};
use crate::package::{PackageManifest, PackageSource, PackageSpecifier, RegistryUrls};
use crate::transport::{HttpClient, TransportClient};

/// Per-batch import options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// Re-fetch and re-compile names that are already loaded or failed
    pub force_reload: bool,
}

/// Imports packages into a virtual module registry
///
/// Each instance owns its registry, manifest cache and resolution table, so
/// independent importers never observe each other.
pub struct Importer {
    pub(super) config: ImporterConfig,
    pub(super) urls: RegistryUrls,
    pub(super) transport: TransportClient,
    pub(super) loader: ModuleLoader,
    pub(super) context: ImportContext,
}

impl Importer {
    /// Create an importer over the given HTTP client
    pub fn new(config: ImporterConfig, http: Arc<dyn HttpClient>) -> Self {
        let registry = VirtualModuleRegistry::new();
        let loader = ModuleLoader::new(registry, config.virtual_root.clone());
        let transport = TransportClient::new(http, config.transport.fetch_options());
        Self {
            urls: RegistryUrls::new(config.registries.clone()),
            transport,
            loader,
            context: ImportContext::new(),
            config,
        }
    }

    /// Create an importer backed by reqwest
    #[cfg(feature = "http-client")]
    pub fn from_config(config: ImporterConfig) -> ImportResult<Self> {
        config
            .validate()
            .map_err(|e| ImportError::Config(e.to_string()))?;
        Ok(Self::new(
            config,
            Arc::new(crate::transport::ReqwestHttpClient::new()),
        ))
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ModuleCompiler>) -> Self {
        self.loader = self.loader.with_compiler(compiler);
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackResolver>) -> Self {
        self.loader = self.loader.with_fallback(fallback);
        self
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    pub fn registry(&self) -> &VirtualModuleRegistry {
        self.loader.registry()
    }

    /// Import a batch of specifiers
    ///
    /// Never fails as a whole; per-package failures are listed in the report.
    pub async fn import_batch<S: AsRef<str>>(&self, specifiers: &[S]) -> BatchReport {
        self.import_batch_with(specifiers, &ImportOptions::default())
            .await
    }

    /// Import a batch of specifiers with explicit options
    pub async fn import_batch_with<S: AsRef<str>>(
        &self,
        specifiers: &[S],
        options: &ImportOptions,
    ) -> BatchReport {
        let report = BatchCollector::default();
        // Top-level specifiers run one after another; only dependency groups fan out.
        for input in specifiers {
            let spec = parse_logged(input.as_ref());
            let _ = self.resolve_package(spec, &[], options, &report).await;
        }
        let report = report.finish();
        info!(
            "Import batch finished: {} succeeded, {} failed, {} cycle warnings",
            report.succeeded.len(),
            report.failed.len(),
            report.warnings.len()
        );
        report
    }

    /// Registered modules, sorted by name
    pub fn list_loaded(&self) -> Vec<LoadedModule> {
        self.registry()
            .records()
            .into_iter()
            .map(|record| LoadedModule {
                is_loaded: self.context.state(&record.logical_name) == ResolutionState::Loaded,
                name: record.logical_name.clone(),
                storage_path: record.storage_path.clone(),
            })
            .collect()
    }

    /// Empty the registry, manifest cache and resolution table
    ///
    /// Records already handed out stay valid.
    pub fn clear_all(&self) {
        self.registry().clear();
        self.context.clear();
        info!("Cleared virtual module registry and manifest cache");
    }

    /// Current resolution state of a logical name
    pub fn state_of(&self, name: &str) -> ResolutionState {
        self.context.state(name)
    }

    /// Registered record for a logical name
    pub fn resolve_module(&self, name: &str) -> Option<Arc<VirtualModuleRecord>> {
        self.registry().get(name)
    }

    /// Resolve a request the way loaded modules do: registry, then fallback
    pub fn require(&self, specifier: &str) -> Option<Resolution> {
        self.loader.resolver().resolve(specifier)
    }

    /// Resolve one package and record its outcome
    ///
    /// `lineage` lists the packages whose dependency lists led here, outermost first.
    fn resolve_package<'a>(
        &'a self,
        spec: PackageSpecifier,
        lineage: &'a [String],
        options: &'a ImportOptions,
        report: &'a BatchCollector,
    ) -> BoxFuture<'a, ImportResult<()>> {
        Box::pin(async move {
            let parent = lineage.last().map(String::as_str);

            if spec.name.is_empty() {
                let err = ImportError::InvalidSpecifier(spec.original_input.clone());
                report.record(failure_outcome(&spec.original_input, parent, &err));
                return Err(err);
            }

            let name = spec.logical_name().to_string();
            let force = options.force_reload && !report.has_outcome(&name);
            match self.context.begin(&name, force) {
                BeginResolution::Started => {}
                BeginResolution::AlreadyLoaded => {
                    debug!("{} already loaded, skipping", name);
                    report.record(ImportOutcome::ok(&name));
                    return Ok(());
                }
                BeginResolution::AlreadyFailed(err) => {
                    debug!("{} previously failed: {}", name, err);
                    report.record(failure_outcome(&name, parent, &err));
                    return Err(err);
                }
                BeginResolution::InFlight => {
                    if lineage.iter().any(|ancestor| ancestor == &name) {
                        let warning = CycleWarning {
                            name: name.clone(),
                            requested_by: parent.map(str::to_string),
                        };
                        warn!("{}", warning);
                        report.warn(warning);
                    } else {
                        let skip = ConcurrentSkip {
                            name: name.clone(),
                            requested_by: parent.map(str::to_string),
                        };
                        warn!("{}", skip);
                        report.skip(skip);
                    }
                    return Ok(());
                }
            }

            let result = match spec.source {
                PackageSource::Github => self.import_github(&spec).await,
                PackageSource::Npm | PackageSource::Yarn => {
                    self.import_registry_package(&spec, lineage, options, report)
                        .await
                }
            };

            match &result {
                Ok(()) => {
                    self.context.finish(&name, ResolutionState::Loaded);
                    report.record(ImportOutcome::ok(&name));
                }
                Err(err) => {
                    warn!("Failed to import {}: {}", name, err);
                    self.context
                        .finish(&name, ResolutionState::Failed(err.clone()));
                    report.record(failure_outcome(&name, parent, err));
                }
            }
            result
        })
    }

    async fn import_registry_package(
        &self,
        spec: &PackageSpecifier,
        lineage: &[String],
        options: &ImportOptions,
        report: &BatchCollector,
    ) -> ImportResult<()> {
        let name = spec.logical_name();
        let manifest = self.fetch_manifest(spec, !options.force_reload).await?;

        let dependencies: Vec<PackageSpecifier> = manifest
            .dependency_specifiers()
            .iter()
            .map(|s| parse_logged(s))
            .collect();

        if !dependencies.is_empty() {
            let mut branch = lineage.to_vec();
            branch.push(name.to_string());
            let group_size = self.config.max_concurrency.max(1);
            for group in dependencies.chunks(group_size) {
                debug!("Resolving {} dependencies of {}", group.len(), name);
                let results = join_all(
                    group
                        .iter()
                        .cloned()
                        .map(|dep| self.resolve_package(dep, &branch, options, report)),
                )
                .await;
                for (dep, result) in group.iter().zip(results) {
                    if let Err(e) = result {
                        warn!(
                            "Dependency {} of {} failed, continuing: {}",
                            dep.logical_name(),
                            name,
                            e
                        );
                    }
                }
            }
        }

        let entry = &manifest.main_entry_path;
        let url = self
            .urls
            .file_url(spec.source, &spec.name, &manifest.resolved_version, entry);
        let source = self.transport.get_text(&url).await?;
        let origin = ModuleOrigin {
            source_url: url,
            entry_path: Some(entry.clone()),
        };
        self.loader.load_with_origin(name, &source, &origin)?;
        info!(
            "Imported {} ({}@{}) from {}",
            name, manifest.name, manifest.resolved_version, spec.source
        );
        Ok(())
    }

    /// Fetch a package manifest, consulting the manifest cache first
    ///
    /// npm tries the CDN, then the registry API. Yarn tries the yarn
    /// registry, then the npm CDN.
    async fn fetch_manifest(
        &self,
        spec: &PackageSpecifier,
        use_cache: bool,
    ) -> ImportResult<Arc<PackageManifest>> {
        let key = spec.cache_key();
        if use_cache {
            if let Some(manifest) = self.context.cached_manifest(&key) {
                debug!("Manifest cache hit for {}", key);
                return Ok(manifest);
            }
        }

        let candidates = match spec.source {
            PackageSource::Yarn => [
                self.urls
                    .manifest_url(PackageSource::Yarn, &spec.name, &spec.version),
                self.urls
                    .manifest_url(PackageSource::Npm, &spec.name, &spec.version),
            ],
            PackageSource::Npm | PackageSource::Github => [
                self.urls
                    .manifest_url(PackageSource::Npm, &spec.name, &spec.version),
                self.urls.registry_api_url(&spec.name, &spec.version),
            ],
        };

        let mut last_error = None;
        for url in candidates {
            match self.transport.get_json(&url).await {
                Ok(doc) => {
                    let manifest = PackageManifest::from_json(&spec.name, &spec.version, &doc)
                        .map_err(|reason| ImportError::InvalidResponse {
                            url: url.clone(),
                            reason,
                        })?;
                    let manifest = Arc::new(manifest);
                    let resolved_key = format!("{}@{}", spec.name, manifest.resolved_version);
                    self.context
                        .cache_manifest(&[key, resolved_key], Arc::clone(&manifest));
                    return Ok(manifest);
                }
                Err(e) => {
                    debug!("Manifest fetch from {} failed: {}", url, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ImportError::ManifestMissing {
            name: spec.name.clone(),
            reason: "no manifest location".to_string(),
        }))
    }
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("config", &self.config)
            .field("loader", &self.loader)
            .finish_non_exhaustive()
    }
}

fn parse_logged(input: &str) -> PackageSpecifier {
    let (spec, degraded) = PackageSpecifier::parse_with_diagnostics(input);
    if let Some(note) = degraded {
        warn!("{}", note);
    }
    spec
}

fn failure_outcome(name: &str, parent: Option<&str>, err: &ImportError) -> ImportOutcome {
    let message = match parent {
        Some(parent) => ImportError::DependencyFailure {
            parent: parent.to_string(),
            dependency: name.to_string(),
            reason: err.to_string(),
        }
        .to_string(),
        None => err.to_string(),
    };
    ImportOutcome::failed(name, message)
}
