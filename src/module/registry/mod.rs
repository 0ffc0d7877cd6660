//! Virtual module registry
//!
//! Maps logical module names to loaded records. Lookups made from inside a
//! loaded module go through a `ResolverChain`: registry first, then the
//! platform fallback.

pub mod resolver;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::debug;

use crate::module::traits::VirtualModuleRecord;

pub use resolver::{BuiltinResolver, NoFallback, Resolution, ResolverChain};

type RecordMap = HashMap<String, Arc<VirtualModuleRecord>>;

/// Shared registry of loaded modules
///
/// Cloning yields another handle to the same registry.
#[derive(Debug, Clone, Default)]
pub struct VirtualModuleRegistry {
    records: Arc<RwLock<RecordMap>>,
}

/// Non-owning handle held by compiled modules
#[derive(Debug, Clone, Default)]
pub struct WeakRegistry {
    records: Weak<RwLock<RecordMap>>,
}

impl WeakRegistry {
    pub fn upgrade(&self) -> Option<VirtualModuleRegistry> {
        self.records
            .upgrade()
            .map(|records| VirtualModuleRegistry { records })
    }
}

impl VirtualModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Poisoning is ignored: every mutation is a single HashMap call.
    fn read(&self) -> RwLockReadGuard<'_, RecordMap> {
        self.records.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, RecordMap> {
        self.records.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn downgrade(&self) -> WeakRegistry {
        WeakRegistry {
            records: Arc::downgrade(&self.records),
        }
    }

    /// Register a record, replacing any previous record with the same name
    pub fn register(&self, record: VirtualModuleRecord) -> Arc<VirtualModuleRecord> {
        let record = Arc::new(record);
        let previous = self
            .write()
            .insert(record.logical_name.clone(), Arc::clone(&record));
        if previous.is_some() {
            debug!("Replaced virtual module {}", record.logical_name);
        }
        record
    }

    pub fn get(&self, name: &str) -> Option<Arc<VirtualModuleRecord>> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn remove(&self, name: &str) -> Option<Arc<VirtualModuleRecord>> {
        self.write().remove(name)
    }

    /// Drop every record; modules still referenced elsewhere stay alive
    pub fn clear(&self) {
        self.write().clear();
    }

    /// All records, sorted by logical name
    pub fn records(&self) -> Vec<Arc<VirtualModuleRecord>> {
        let mut records: Vec<_> = self.read().values().cloned().collect();
        records.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
        records
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
