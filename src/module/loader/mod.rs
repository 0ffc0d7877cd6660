//! Module loading
//!
//! Compiles fetched sources and registers them as virtual modules.

pub mod loader;

pub use loader::{ModuleLoader, ModuleOrigin};
