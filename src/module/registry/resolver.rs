//! Resolver chain: virtual registry first, platform fallback second

use std::fmt;
use std::sync::Arc;

use crate::module::registry::{VirtualModuleRegistry, WeakRegistry};
use crate::module::traits::{FallbackResolver, VirtualModuleRecord};

/// Result of resolving a module request
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Found in the virtual module registry
    Virtual(Arc<VirtualModuleRecord>),
    /// Resolved by the fallback resolver
    Fallback(String),
}

/// Fallback that resolves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

impl FallbackResolver for NoFallback {
    fn resolve(&self, _specifier: &str) -> Option<String> {
        None
    }
}

/// Node.js core modules, with or without the `node:` prefix
const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "fs/promises",
    "http", "http2", "https", "inspector", "module", "net", "os", "path", "path/posix",
    "path/win32", "perf_hooks", "process", "punycode", "querystring", "readline", "repl",
    "stream", "stream/promises", "string_decoder", "timers", "timers/promises", "tls",
    "trace_events", "tty", "url", "util", "util/types", "v8", "vm", "wasi", "worker_threads",
    "zlib",
];

/// Fallback that resolves Node.js core module names to `node:<name>`
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinResolver;

impl FallbackResolver for BuiltinResolver {
    fn resolve(&self, specifier: &str) -> Option<String> {
        let bare = specifier.strip_prefix("node:").unwrap_or(specifier);
        NODE_BUILTINS
            .contains(&bare)
            .then(|| format!("node:{}", bare))
    }
}

/// Lookup chain handed to every compiled module
///
/// Holds the registry weakly so records never keep their own registry alive.
#[derive(Clone)]
pub struct ResolverChain {
    registry: WeakRegistry,
    fallback: Arc<dyn FallbackResolver>,
}

impl ResolverChain {
    pub fn new(registry: &VirtualModuleRegistry, fallback: Arc<dyn FallbackResolver>) -> Self {
        Self {
            registry: registry.downgrade(),
            fallback,
        }
    }

    pub fn resolve(&self, specifier: &str) -> Option<Resolution> {
        if let Some(record) = self.registry.upgrade().and_then(|r| r.get(specifier)) {
            return Some(Resolution::Virtual(record));
        }
        self.fallback.resolve(specifier).map(Resolution::Fallback)
    }
}

impl fmt::Debug for ResolverChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverChain")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
