//! Package model: specifiers, manifests and registry URLs

pub mod manifest;
pub mod specifier;
pub mod urls;

pub use manifest::PackageManifest;
pub use specifier::{normalize_version, PackageSource, PackageSpecifier, ParseDegraded, LATEST};
pub use urls::{RegistryUrls, GITHUB_BRANCHES};
