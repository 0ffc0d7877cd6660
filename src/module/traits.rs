//! Module system traits and records
//!
//! The compiler and the fallback resolver are the two platform seams:
//! everything else in the module system is plain bookkeeping.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ImportResult;
use crate::module::registry::{Resolution, ResolverChain};

/// Module syntax detected at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleFormat {
    /// `import`/`export` statements present
    EsModule,
    /// Plain script, `require()` style
    CommonJs,
}

/// Output of a `ModuleCompiler`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledUnit {
    pub format: ModuleFormat,
    /// Static dependency requests in source order, without duplicates
    pub requests: Vec<String>,
}

/// Turns source text into an executable unit
///
/// Implementations must not perform I/O; compilation is a single
/// synchronous step.
pub trait ModuleCompiler: Send + Sync {
    fn compile(&self, name: &str, source: &str) -> ImportResult<CompiledUnit>;
}

/// Resolution for names the virtual registry does not know
pub trait FallbackResolver: Send + Sync {
    /// Return an identifier for the resolved module, or `None`
    fn resolve(&self, specifier: &str) -> Option<String>;
}

/// A compiled module bound to the resolver chain it was loaded through
#[derive(Debug)]
pub struct CompiledModule {
    name: String,
    source: Arc<str>,
    unit: CompiledUnit,
    scope: ResolverChain,
}

impl CompiledModule {
    pub(crate) fn new(name: String, source: Arc<str>, unit: CompiledUnit, scope: ResolverChain) -> Self {
        Self {
            name,
            source,
            unit,
            scope,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn format(&self) -> ModuleFormat {
        self.unit.format
    }

    /// Static dependency requests found in the source
    pub fn requests(&self) -> &[String] {
        &self.unit.requests
    }

    /// Resolve a request made from inside this module
    ///
    /// Virtual modules are consulted first, then the fallback resolver.
    pub fn require(&self, specifier: &str) -> Option<Resolution> {
        self.scope.resolve(specifier)
    }

    /// Requests that currently resolve to nothing
    pub fn unresolved_requests(&self) -> Vec<&str> {
        self.unit
            .requests
            .iter()
            .filter(|r| self.scope.resolve(r).is_none())
            .map(String::as_str)
            .collect()
    }
}

/// Registry entry for a successfully loaded module
#[derive(Debug, Clone)]
pub struct VirtualModuleRecord {
    /// Name the module is addressable by
    pub logical_name: String,
    /// Virtual path reported for the module's entry file
    pub storage_path: PathBuf,
    /// Compiled module handle
    pub compiled: Arc<CompiledModule>,
    /// Unix timestamp (seconds) of the load
    pub loaded_at: u64,
    /// URL the source was fetched from (empty for direct loads)
    pub source_url: String,
    /// SHA-256 of the source text, hex encoded
    pub content_hash: String,
}
