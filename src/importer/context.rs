//! Shared importer state
//!
//! One `ImportContext` per importer instance: the resolution table (per-name
//! state plus the in-flight set) and the manifest cache. Each lives behind
//! its own lock, held only for one synchronous step and never across an await.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use crate::error::ImportError;
use crate::package::PackageManifest;

/// Per-name resolution state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    NotStarted,
    Resolving,
    Loaded,
    Failed(ImportError),
}

/// Outcome of trying to start resolving a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginResolution {
    /// Name marked `Resolving`; the caller owns it until `finish`
    Started,
    /// Already loaded in this context
    AlreadyLoaded,
    /// Previously failed with the recorded error
    AlreadyFailed(ImportError),
    /// Currently resolving further up (or beside) this branch
    InFlight,
}

#[derive(Debug, Default)]
struct ResolutionTable {
    states: HashMap<String, ResolutionState>,
    in_flight: HashSet<String>,
}

/// Importer-owned shared state
#[derive(Debug, Default)]
pub struct ImportContext {
    table: Mutex<ResolutionTable>,
    manifests: RwLock<HashMap<String, Arc<PackageManifest>>>,
}

impl ImportContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, ResolutionTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically check the state of `name` and mark it `Resolving` if allowed
    ///
    /// With `force`, terminal states are reset; an in-flight name is never restarted.
    pub fn begin(&self, name: &str, force: bool) -> BeginResolution {
        let mut table = self.table();
        if table.in_flight.contains(name) {
            return BeginResolution::InFlight;
        }
        if !force {
            match table.states.get(name) {
                Some(ResolutionState::Loaded) => return BeginResolution::AlreadyLoaded,
                Some(ResolutionState::Failed(err)) => {
                    return BeginResolution::AlreadyFailed(err.clone())
                }
                _ => {}
            }
        }
        table.in_flight.insert(name.to_string());
        table
            .states
            .insert(name.to_string(), ResolutionState::Resolving);
        BeginResolution::Started
    }

    /// Record the terminal state of `name` and drop it from the in-flight set
    pub fn finish(&self, name: &str, state: ResolutionState) {
        let mut table = self.table();
        table.in_flight.remove(name);
        table.states.insert(name.to_string(), state);
    }

    pub fn state(&self, name: &str) -> ResolutionState {
        self.table()
            .states
            .get(name)
            .cloned()
            .unwrap_or(ResolutionState::NotStarted)
    }

    pub fn is_in_flight(&self, name: &str) -> bool {
        self.table().in_flight.contains(name)
    }

    pub fn in_flight_count(&self) -> usize {
        self.table().in_flight.len()
    }

    pub fn cached_manifest(&self, key: &str) -> Option<Arc<PackageManifest>> {
        self.manifests
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    /// Cache a manifest under each of `keys`
    pub fn cache_manifest(&self, keys: &[String], manifest: Arc<PackageManifest>) {
        let mut manifests = self.manifests.write().unwrap_or_else(|e| e.into_inner());
        for key in keys {
            manifests.insert(key.clone(), Arc::clone(&manifest));
        }
    }

    pub fn manifest_count(&self) -> usize {
        self.manifests.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Forget every state, in-flight entry and cached manifest
    pub fn clear(&self) {
        {
            let mut table = self.table();
            table.states.clear();
            table.in_flight.clear();
        }
        self.manifests
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
