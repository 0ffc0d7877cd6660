//! Virtual module system
//!
//! Fetched sources are compiled by a `ModuleCompiler`, wrapped in a
//! `VirtualModuleRecord` and registered by logical name. Code inside a loaded
//! module resolves other modules through a `ResolverChain`: the virtual
//! registry first, then a `FallbackResolver` for everything else.

pub mod compiler;
pub mod loader;
pub mod registry;
pub mod traits;

pub use compiler::ScriptCompiler;
pub use loader::{ModuleLoader, ModuleOrigin};
pub use registry::{BuiltinResolver, NoFallback, Resolution, ResolverChain, VirtualModuleRegistry};
pub use traits::{
    CompiledModule, CompiledUnit, FallbackResolver, ModuleCompiler, ModuleFormat,
    VirtualModuleRecord,
};
