//! PHP version naming.
//!
//! Every version a user types (`php8.2`, `php@8.2`, `82`, `php-8.2`) is
//! reduced to a canonical `MAJOR.MINOR` before it touches the filesystem.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PhpConfig;
use crate::error::{ValetError, ValetResult};

/// Versions accepted as the global default.
pub const DEFAULT_SUPPORTED_VERSIONS: &[&str] = &[
    "7.1", "7.2", "7.3", "7.4", "8.0", "8.1", "8.2", "8.3", "8.4",
];

/// Versions accepted for per-site isolation, including deprecated ones.
pub const ISOLATION_SUPPORTED_VERSIONS: &[&str] = &[
    "5.6", "7.0", "7.1", "7.2", "7.3", "7.4", "8.0", "8.1", "8.2", "8.3", "8.4",
];

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.(\d+))?").expect("version pattern compiles"));

/// Reduce a user-supplied version alias to `MAJOR.MINOR`.
///
/// A dotted pair is taken as is (patch levels are dropped). A bare digit run
/// is split after its first digit, so `82` becomes `8.2` and `810` becomes
/// `8.10`.
pub fn normalize(input: &str) -> ValetResult<String> {
    let invalid = || ValetError::InvalidVersionFormat {
        input: input.to_string(),
    };

    let captures = VERSION_PATTERN.captures(input.trim()).ok_or_else(invalid)?;
    let major = &captures[1];

    if let Some(minor) = captures.get(2) {
        return Ok(format!("{}.{}", major, minor.as_str()));
    }

    if major.len() < 2 {
        return Err(invalid());
    }
    let (first, rest) = major.split_at(1);
    Ok(format!("{}.{}", first, rest))
}

/// All digits of a version, e.g. `8.2` -> `82`.
pub fn version_digits(version: &str) -> String {
    version.chars().filter(char::is_ascii_digit).collect()
}

/// FPM socket file name for a version: `valet82.sock`.
pub fn socket_file_name(version: &str) -> String {
    format!("valet{}.sock", version_digits(version))
}

/// Absolute FPM socket path inside the Valet home.
pub fn socket_path(home: &Path, version: &str) -> PathBuf {
    home.join(socket_file_name(version))
}

/// The two allow-lists, built-ins plus any additions from the settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedVersions {
    default: Vec<String>,
    isolation: Vec<String>,
}

impl SupportedVersions {
    pub fn new(config: &PhpConfig) -> Self {
        Self {
            default: merge(DEFAULT_SUPPORTED_VERSIONS, &config.additional_default_versions),
            isolation: merge(
                ISOLATION_SUPPORTED_VERSIONS,
                &config.additional_isolation_versions,
            ),
        }
    }

    pub fn default_versions(&self) -> &[String] {
        &self.default
    }

    pub fn isolation_versions(&self) -> &[String] {
        &self.isolation
    }

    /// Accept a canonical version as the global default.
    pub fn validate_default(&self, version: &str) -> ValetResult<String> {
        check(version, &self.default, "as the default version")
    }

    /// Accept a canonical version for per-site isolation.
    pub fn validate_isolation(&self, version: &str) -> ValetResult<String> {
        check(version, &self.isolation, "for site isolation")
    }
}

impl Default for SupportedVersions {
    fn default() -> Self {
        Self::new(&PhpConfig::default())
    }
}

fn merge(builtin: &[&str], extra: &[String]) -> Vec<String> {
    let mut versions: Vec<String> = builtin.iter().map(|v| v.to_string()).collect();
    for version in extra {
        // Settings are free text; only keep what normalizes.
        if let Ok(canonical) = normalize(version) {
            if !versions.contains(&canonical) {
                versions.push(canonical);
            }
        }
    }
    versions
}

fn check(version: &str, allowed: &[String], context: &'static str) -> ValetResult<String> {
    if allowed.iter().any(|v| v == version) {
        return Ok(version.to_string());
    }
    Err(ValetError::UnsupportedVersion {
        version: version.to_string(),
        context,
        supported: allowed.join(", "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalize_identically() {
        for alias in ["php8.2", "php@8.2", "82", "php-8.2", "8.2", " 8.2.15 "] {
            assert_eq!(normalize(alias).unwrap(), "8.2", "alias {alias}");
        }
        assert_eq!(normalize("php74").unwrap(), "7.4");
        assert_eq!(normalize("810").unwrap(), "8.10");
    }

    #[test]
    fn test_no_digits_is_invalid() {
        assert!(matches!(
            normalize("latest"),
            Err(ValetError::InvalidVersionFormat { input }) if input == "latest"
        ));
        assert!(normalize("").is_err());
        assert!(normalize("php8").is_err());
    }

    #[test]
    fn test_socket_names_are_distinct() {
        assert_eq!(socket_file_name("8.2"), "valet82.sock");
        assert_eq!(socket_file_name("7.4"), "valet74.sock");
        assert_ne!(socket_file_name("8.1"), socket_file_name("8.10"));
        assert_eq!(
            socket_path(Path::new("/home/dev/.valet"), "8.3"),
            PathBuf::from("/home/dev/.valet/valet83.sock")
        );
    }

    #[test]
    fn test_isolation_list_is_superset() {
        let supported = SupportedVersions::default();
        for version in supported.default_versions() {
            assert!(supported.isolation_versions().contains(version));
        }
        assert!(supported.validate_isolation("5.6").is_ok());
        assert!(matches!(
            supported.validate_default("5.6"),
            Err(ValetError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_settings_extend_lists() {
        let config = PhpConfig {
            additional_default_versions: vec!["php8.5".to_string(), "bogus".to_string()],
            ..PhpConfig::default()
        };
        let supported = SupportedVersions::new(&config);
        assert_eq!(supported.validate_default("8.5").unwrap(), "8.5");
        assert!(supported.validate_isolation("8.5").is_err());
    }
}
