//! GitHub import path
//!
//! No dependency graph: `package.json` is read only to find the entry file.
//! Branches are tried in order and the first one serving both the manifest
//! and the entry file wins.

use tracing::{debug, info};

use crate::error::{ImportError, ImportResult};
use crate::importer::resolver::Importer;
use crate::module::loader::ModuleOrigin;
use crate::package::{PackageManifest, PackageSpecifier, GITHUB_BRANCHES, LATEST};

impl Importer {
    pub(super) async fn import_github(&self, spec: &PackageSpecifier) -> ImportResult<()> {
        let (owner, repo) = spec
            .github_repo()
            .ok_or_else(|| ImportError::InvalidSpecifier(spec.original_input.clone()))?;

        let mut last_error = None;
        for branch in GITHUB_BRANCHES {
            let manifest_url = self
                .urls
                .github_file_url(owner, repo, branch, "package.json");
            let doc = match self.transport.get_json(&manifest_url).await {
                Ok(doc) => doc,
                Err(e) => {
                    debug!("{}/{}: no manifest on {}: {}", owner, repo, branch, e);
                    last_error = Some(e);
                    continue;
                }
            };
            let manifest = match PackageManifest::from_json(repo, LATEST, &doc) {
                Ok(manifest) => manifest,
                Err(reason) => {
                    last_error = Some(ImportError::InvalidResponse {
                        url: manifest_url,
                        reason,
                    });
                    continue;
                }
            };

            let entry_url =
                self.urls
                    .github_file_url(owner, repo, branch, &manifest.main_entry_path);
            let source = match self.transport.get_text(&entry_url).await {
                Ok(source) => source,
                Err(e) => {
                    debug!("{}/{}: no entry file on {}: {}", owner, repo, branch, e);
                    last_error = Some(e);
                    continue;
                }
            };

            // Branch accepted; a compile failure here is final.
            let origin = ModuleOrigin {
                source_url: entry_url,
                entry_path: Some(manifest.main_entry_path.clone()),
            };
            self.loader
                .load_with_origin(spec.logical_name(), &source, &origin)?;
            info!("Imported github:{}/{} from branch {}", owner, repo, branch);
            return Ok(());
        }

        let reason = match last_error {
            Some(e) => format!(
                "no usable branch among {} (last error: {})",
                GITHUB_BRANCHES.join(", "),
                e
            ),
            None => format!("no usable branch among {}", GITHUB_BRANCHES.join(", ")),
        };
        Err(ImportError::ManifestMissing {
            name: spec.name.clone(),
            reason,
        })
    }
}
