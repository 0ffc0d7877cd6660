//! Registry URL builder
//!
//! Maps `(source, name, version, path)` to concrete registry/CDN URLs.
//! URLs are assembled with `url::Url::path_segments_mut`, so the `/` of a
//! scoped name stays a path separator and every segment is percent-encoded.
//!
//! Yarn files are served from `yarn_cdn` when configured and otherwise fall
//! back to the npm CDN scheme. Callers must not assume a distinct Yarn CDN.

use tracing::warn;
use url::Url;

use crate::config::RegistryConfig;
use crate::package::specifier::PackageSource;

/// GitHub branches tried, in order, when importing `github:owner/repo`
pub const GITHUB_BRANCHES: [&str; 2] = ["main", "master"];

/// URL builder bound to a set of registry base URLs
#[derive(Debug, Clone, Default)]
pub struct RegistryUrls {
    config: RegistryConfig,
}

impl RegistryUrls {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Primary manifest URL for an npm or yarn package
    pub fn manifest_url(&self, source: PackageSource, name: &str, version: &str) -> String {
        match source {
            PackageSource::Yarn => join_segments(
                &self.config.yarn_registry,
                name_segments(name).chain([version]),
            ),
            PackageSource::Npm | PackageSource::Github => self.file_url(
                PackageSource::Npm,
                name,
                version,
                "package.json",
            ),
        }
    }

    /// npm registry API URL, used when the CDN manifest is unavailable
    pub fn registry_api_url(&self, name: &str, version: &str) -> String {
        join_segments(
            &self.config.npm_registry,
            name_segments(name).chain([version]),
        )
    }

    /// URL of a file inside a published npm or yarn package
    pub fn file_url(&self, source: PackageSource, name: &str, version: &str, path: &str) -> String {
        let base = match source {
            PackageSource::Yarn => self
                .config
                .yarn_cdn
                .as_deref()
                .unwrap_or(&self.config.npm_cdn),
            PackageSource::Npm | PackageSource::Github => &self.config.npm_cdn,
        };
        // `name@version` is one segment; a scope stays its own segment.
        let (scope, bare) = match name.split_once('/') {
            Some((scope, bare)) if scope.starts_with('@') => (Some(scope), bare),
            _ => (None, name),
        };
        let pinned = format!("{}@{}", bare, version);
        join_segments(
            base,
            scope
                .into_iter()
                .chain([pinned.as_str()])
                .chain(path_segments(path)),
        )
    }

    /// Raw GitHub URL of a file on a branch
    pub fn github_file_url(&self, owner: &str, repo: &str, branch: &str, path: &str) -> String {
        join_segments(
            &self.config.github_raw,
            [owner, repo]
                .into_iter()
                .chain(path_segments(branch))
                .chain(path_segments(path)),
        )
    }
}

fn name_segments(name: &str) -> impl Iterator<Item = &str> {
    name.split('/').filter(|s| !s.is_empty())
}

/// Relative path segments, without empty and `.` segments
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty() && *s != ".")
}

/// Append percent-encoded segments to a base URL
///
/// Bases are checked by `ImporterConfig::validate`; an unparseable base is
/// joined verbatim.
pub fn join_segments<'s>(base: &str, segments: impl IntoIterator<Item = &'s str>) -> String {
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(e) => {
            warn!("Invalid registry base URL {:?}: {}", base, e);
            let tail: Vec<&str> = segments.into_iter().collect();
            return format!("{}/{}", base.trim_end_matches('/'), tail.join("/"));
        }
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url.into()
}
