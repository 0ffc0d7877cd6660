//! Package manifest (the subset of package.json the importer needs)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Entry used when a manifest declares neither `module` nor `main`
pub const DEFAULT_ENTRY: &str = "index.js";

/// Fetched package manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Package name as published (falls back to the requested name)
    pub name: String,
    /// Concrete version the registry resolved the request to
    pub resolved_version: String,
    /// Entry file path relative to the package root
    pub main_entry_path: String,
    /// Declared runtime dependencies (name -> version token)
    pub dependencies: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Extract a manifest from a parsed package.json document
    ///
    /// The ES module entry (`module`) is preferred over the CommonJS `main`
    /// field, falling back to `index.js`.
    pub fn from_json(
        requested_name: &str,
        requested_version: &str,
        doc: &Value,
    ) -> Result<Self, String> {
        let obj = doc
            .as_object()
            .ok_or_else(|| format!("manifest for {} is not a JSON object", requested_name))?;

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(requested_name)
            .to_string();

        let resolved_version = obj
            .get("version")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(requested_version)
            .to_string();

        let entry = ["module", "main"]
            .iter()
            .find_map(|field| {
                obj.get(*field)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or(DEFAULT_ENTRY);

        let dependencies = match obj.get("dependencies") {
            Some(Value::Object(deps)) => deps
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            Some(Value::Null) | None => BTreeMap::new(),
            Some(other) => {
                return Err(format!(
                    "dependencies of {} must be an object, got {}",
                    name, other
                ))
            }
        };

        Ok(Self {
            name,
            resolved_version,
            main_entry_path: normalize_entry(entry),
            dependencies,
        })
    }

    /// Dependency specifiers in `name@token` form, ready for the parser
    pub fn dependency_specifiers(&self) -> Vec<String> {
        self.dependencies
            .iter()
            .map(|(name, token)| format!("{}@{}", name, token))
            .collect()
    }
}

/// Normalize an entry path: drop `./`, resolve directory entries to
/// `index.js` and give extensionless files a `.js` suffix
pub fn normalize_entry(entry: &str) -> String {
    let mut path = entry.trim();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    let path = path.trim_start_matches('/');

    if path.is_empty() || path == "." {
        return DEFAULT_ENTRY.to_string();
    }
    if path.ends_with('/') {
        return format!("{}{}", path, DEFAULT_ENTRY);
    }

    let file = path.rsplit('/').next().unwrap_or(path);
    if file.contains('.') {
        path.to_string()
    } else {
        format!("{}.js", path)
    }
}
