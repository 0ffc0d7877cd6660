//! Module loader implementation
//!
//! Compiles source text, binds it to the registry's resolver chain and
//! registers the resulting record (last load wins).

use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::error::ImportResult;
use crate::module::compiler::ScriptCompiler;
use crate::module::registry::{NoFallback, ResolverChain, VirtualModuleRegistry};
use crate::module::traits::{
    CompiledModule, FallbackResolver, ModuleCompiler, VirtualModuleRecord,
};
use crate::package::manifest::DEFAULT_ENTRY;
use crate::utils::current_timestamp;

/// Where a loaded source came from
#[derive(Debug, Clone, Default)]
pub struct ModuleOrigin {
    /// URL the source was fetched from
    pub source_url: String,
    /// Entry path inside the package (defaults to `index.js`)
    pub entry_path: Option<String>,
}

/// Loads sources into a `VirtualModuleRegistry`
#[derive(Clone)]
pub struct ModuleLoader {
    compiler: Arc<dyn ModuleCompiler>,
    fallback: Arc<dyn FallbackResolver>,
    registry: VirtualModuleRegistry,
    virtual_root: PathBuf,
}

impl ModuleLoader {
    /// Create a loader with the default script compiler and no fallback
    pub fn new(registry: VirtualModuleRegistry, virtual_root: impl Into<PathBuf>) -> Self {
        Self {
            compiler: Arc::new(ScriptCompiler::new()),
            fallback: Arc::new(NoFallback),
            registry,
            virtual_root: virtual_root.into(),
        }
    }

    pub fn with_compiler(mut self, compiler: Arc<dyn ModuleCompiler>) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn FallbackResolver>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn registry(&self) -> &VirtualModuleRegistry {
        &self.registry
    }

    /// Resolver chain used by modules this loader produces
    pub fn resolver(&self) -> ResolverChain {
        ResolverChain::new(&self.registry, Arc::clone(&self.fallback))
    }

    /// Compile and register `source` under `name`
    pub fn load(&self, name: &str, source: &str) -> ImportResult<Arc<VirtualModuleRecord>> {
        self.load_with_origin(name, source, &ModuleOrigin::default())
    }

    /// Compile and register `source` under `name`, recording where it came from
    ///
    /// Fails with `ImportError::Compile`; the registry is untouched on failure.
    pub fn load_with_origin(
        &self,
        name: &str,
        source: &str,
        origin: &ModuleOrigin,
    ) -> ImportResult<Arc<VirtualModuleRecord>> {
        let unit = self.compiler.compile(name, source)?;
        let compiled = CompiledModule::new(name.to_string(), Arc::from(source), unit, self.resolver());

        let entry = origin.entry_path.as_deref().unwrap_or(DEFAULT_ENTRY);
        let record = VirtualModuleRecord {
            logical_name: name.to_string(),
            storage_path: self.virtual_root.join(name).join(entry),
            compiled: Arc::new(compiled),
            loaded_at: current_timestamp(),
            source_url: origin.source_url.clone(),
            content_hash: hex::encode(Sha256::digest(source.as_bytes())),
        };

        let record = self.registry.register(record);
        info!(
            "Loaded virtual module {} ({} bytes) at {}",
            name,
            source.len(),
            record.storage_path.display()
        );
        Ok(record)
    }
}

impl std::fmt::Debug for ModuleLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleLoader")
            .field("registry", &self.registry)
            .field("virtual_root", &self.virtual_root)
            .finish_non_exhaustive()
    }
}
