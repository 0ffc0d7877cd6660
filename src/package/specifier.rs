//! Package specifier parsing
//!
//! Grammar: `[alias@]name[@version]`, `alias@source:name[@version]`,
//! `source:name[@version]` and `github:owner/repo`. Scoped names keep their
//! leading `@scope/` segment.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version token meaning "whatever the registry currently tags as latest"
pub const LATEST: &str = "latest";

/// Where a package is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageSource {
    #[default]
    Npm,
    Yarn,
    Github,
}

impl PackageSource {
    /// Specifier prefix for this source, including the colon
    pub fn prefix(&self) -> &'static str {
        match self {
            PackageSource::Npm => "npm:",
            PackageSource::Yarn => "yarn:",
            PackageSource::Github => "github:",
        }
    }

    const ALL: [PackageSource; 3] = [PackageSource::Npm, PackageSource::Yarn, PackageSource::Github];
}

impl fmt::Display for PackageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageSource::Npm => "npm",
            PackageSource::Yarn => "yarn",
            PackageSource::Github => "github",
        };
        f.write_str(name)
    }
}

/// Parsed package request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageSpecifier {
    /// Real package name (`lodash`, `@scope/pkg`, `owner/repo` for GitHub)
    pub name: String,
    /// Exact version token or `latest`
    pub version: String,
    /// Registry or repository host
    pub source: PackageSource,
    /// User-chosen name the package is registered under
    pub alias: Option<String>,
    /// The string this specifier was parsed from
    pub original_input: String,
}

/// Non-fatal note that the input was only partially understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDegraded {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for ParseDegraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "specifier {:?} degraded: {}", self.input, self.reason)
    }
}

impl PackageSpecifier {
    /// Parse a specifier string. Never fails; see `parse_with_diagnostics`.
    pub fn parse(input: &str) -> Self {
        Self::parse_with_diagnostics(input).0
    }

    /// Parse a specifier string, reporting best-effort interpretations
    pub fn parse_with_diagnostics(input: &str) -> (Self, Option<ParseDegraded>) {
        let trimmed = input.trim();
        let mut notes = Vec::new();

        let (alias, source, target) = match strip_source_prefix(trimmed) {
            Some((source, target)) => (None, source, target),
            None => match split_at_version(trimmed) {
                Some((left, rest)) => match strip_source_prefix(rest) {
                    Some((source, target)) => {
                        if left.is_empty() {
                            notes.push("empty alias before source prefix".to_string());
                        }
                        let alias = Some(left.to_string()).filter(|a| !a.is_empty());
                        (alias, source, target)
                    }
                    None => (None, PackageSource::Npm, trimmed),
                },
                None => (None, PackageSource::Npm, trimmed),
            },
        };

        let (name, version) = match source {
            PackageSource::Github => {
                let repo = target.trim_end_matches('/');
                let well_formed = repo
                    .split_once('/')
                    .map(|(owner, name)| !owner.is_empty() && !name.is_empty() && !name.contains('/'))
                    .unwrap_or(false);
                if !well_formed {
                    notes.push(format!("expected owner/repo, got {:?}", repo));
                }
                (repo.to_string(), LATEST.to_string())
            }
            PackageSource::Npm | PackageSource::Yarn => match split_at_version(target) {
                Some((name, raw_version)) => {
                    if raw_version.trim().is_empty() {
                        notes.push("empty version after '@'".to_string());
                    }
                    let (version, note) = normalize_version(raw_version);
                    notes.extend(note);
                    (name.to_string(), version)
                }
                None => (target.to_string(), LATEST.to_string()),
            },
        };

        if name.is_empty() {
            notes.push("empty package name".to_string());
        }

        let spec = PackageSpecifier {
            name,
            version,
            source,
            alias,
            original_input: input.to_string(),
        };
        let degraded = if notes.is_empty() {
            None
        } else {
            Some(ParseDegraded {
                input: input.to_string(),
                reason: notes.join("; "),
            })
        };
        (spec, degraded)
    }

    /// Name the package is registered under: the alias if given, else the real name
    pub fn logical_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// `(owner, repo)` for GitHub specifiers
    pub fn github_repo(&self) -> Option<(&str, &str)> {
        if self.source != PackageSource::Github {
            return None;
        }
        self.name
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty())
    }

    /// Manifest cache key
    pub fn cache_key(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

impl fmt::Display for PackageSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(alias) = &self.alias {
            write!(f, "{}@", alias)?;
        }
        match self.source {
            PackageSource::Github => write!(f, "github:{}", self.name),
            PackageSource::Yarn => write!(f, "yarn:{}@{}", self.name, self.version),
            PackageSource::Npm if self.alias.is_some() => {
                write!(f, "npm:{}@{}", self.name, self.version)
            }
            PackageSource::Npm => write!(f, "{}@{}", self.name, self.version),
        }
    }
}

/// Split `name@rest` on the first `@` that is not the leading scope marker
fn split_at_version(input: &str) -> Option<(&str, &str)> {
    let skip = usize::from(input.starts_with('@'));
    input[skip..]
        .find('@')
        .map(|i| (&input[..skip + i], &input[skip + i + 1..]))
}

fn strip_source_prefix(input: &str) -> Option<(PackageSource, &str)> {
    PackageSource::ALL
        .iter()
        .find_map(|source| input.strip_prefix(source.prefix()).map(|rest| (*source, rest)))
}

/// Reduce a version token to an exact pin or `latest`
///
/// Leading `^`, `~`, `=` and a `v` before the major number are stripped.
/// Anything that still looks like a range collapses to `latest`, with a note.
pub fn normalize_version(token: &str) -> (String, Option<String>) {
    let stripped = token.trim().trim_start_matches(['^', '~', '=']).trim();
    let stripped = match stripped.strip_prefix(['v', 'V']) {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
        _ => stripped,
    };

    if stripped.is_empty() || matches!(stripped, "*" | "x" | "X" | LATEST) {
        return (LATEST.to_string(), None);
    }

    let has_range_syntax = stripped.contains(['<', '>', '|', ' '])
        || stripped
            .split('.')
            .any(|part| matches!(part, "x" | "X" | "*"));
    if has_range_syntax {
        return (
            LATEST.to_string(),
            Some(format!("version range {:?} treated as latest", token.trim())),
        );
    }

    (stripped.to_string(), None)
}
