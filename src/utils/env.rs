//! Environment variable utilities
//!
//! Helpers used by `ImporterConfig::apply_env_overrides`.

/// Get environment variable as Option
///
/// Empty values are treated as unset.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get environment variable as integer
///
/// Returns `Some(value)` if set and parseable, `None` otherwise.
pub fn env_int<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    std::env::var(key).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variables() {
        assert_eq!(env_opt("PKG_IMPORTER_TEST_SURELY_UNSET_VAR"), None);
        assert_eq!(env_int::<u32>("PKG_IMPORTER_TEST_SURELY_UNSET_VAR"), None);
    }
}
