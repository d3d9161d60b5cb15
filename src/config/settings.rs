//! Engine settings for Valet.
//!
//! Settings describe *how* the engine talks to the machine (paths, timeouts,
//! distro conventions). The mutable global parameters of the site fleet live in
//! `config.json`, see [`super::ConfigStore`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ValetError;

/// Main settings structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub php: PhpConfig,
    #[serde(default)]
    pub certificates: CertificatesConfig,
}

/// Filesystem locations.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Valet home directory. Defaults to `~/.valet` of the developer user.
    #[serde(default)]
    pub home: Option<PathBuf>,
    /// PHP front controller that routes every request of a plain site.
    #[serde(default)]
    pub server_script: Option<PathBuf>,
    /// Catch-all Nginx server block serving unsecured plain sites.
    #[serde(default = "default_catch_all")]
    pub nginx_catch_all: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Limits configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Timeout for ordinary external commands in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
    /// Timeout for package installation in seconds.
    #[serde(default = "default_install_timeout")]
    pub install_timeout_seconds: u64,
    /// Attempts for service start/restart before giving up.
    #[serde(default = "default_service_attempts")]
    pub service_attempts: u32,
    /// Delay between service attempts in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

/// PHP-FPM distro conventions.
#[derive(Debug, Clone, Deserialize)]
pub struct PhpConfig {
    /// Ordered candidate pool directories. `{version}` expands to `8.2`,
    /// `{digits}` to `82`.
    #[serde(default = "default_pool_candidates")]
    pub pool_candidates: Vec<String>,
    /// Systemd unit name pattern for FPM.
    #[serde(default = "default_fpm_pattern")]
    pub service_pattern: String,
    /// Package name pattern for FPM.
    #[serde(default = "default_fpm_pattern")]
    pub package_pattern: String,
    /// Location of the system-wide `php` CLI link.
    #[serde(default = "default_cli_link")]
    pub cli_link: PathBuf,
    /// Versioned CLI binary pattern the link points at.
    #[serde(default = "default_cli_binary_pattern")]
    pub cli_binary_pattern: String,
    /// Versions accepted by `use` beyond the built-in list.
    #[serde(default)]
    pub additional_default_versions: Vec<String>,
    /// Versions accepted by `isolate` beyond the built-in list.
    #[serde(default)]
    pub additional_isolation_versions: Vec<String>,
}

/// Local certificate authority settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificatesConfig {
    /// Root CA validity in days.
    #[serde(default = "default_ca_validity")]
    pub ca_validity_days: u32,
    /// Leaf certificate validity in days.
    #[serde(default = "default_leaf_validity")]
    pub leaf_validity_days: u32,
    /// Whether to touch the OS and browser trust stores at all.
    #[serde(default = "default_manage_trust")]
    pub manage_trust_store: bool,
}

// Default value functions
fn default_catch_all() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-available/valet.conf")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_command_timeout() -> u64 {
    120
}

fn default_install_timeout() -> u64 {
    1800
}

fn default_service_attempts() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

fn default_pool_candidates() -> Vec<String> {
    vec![
        "/etc/php/{version}/fpm/pool.d".to_string(),
        "/etc/php{digits}/php-fpm.d".to_string(),
        "/etc/opt/remi/php{digits}/php-fpm.d".to_string(),
        "/etc/php/php-fpm.d".to_string(),
        "/etc/php-fpm.d".to_string(),
    ]
}

fn default_fpm_pattern() -> String {
    "php{version}-fpm".to_string()
}

fn default_cli_link() -> PathBuf {
    PathBuf::from("/usr/bin/php")
}

fn default_cli_binary_pattern() -> String {
    "/usr/bin/php{version}".to_string()
}

fn default_ca_validity() -> u32 {
    730
}

fn default_leaf_validity() -> u32 {
    368
}

fn default_manage_trust() -> bool {
    true
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            home: None,
            server_script: None,
            nginx_catch_all: default_catch_all(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            command_timeout_seconds: default_command_timeout(),
            install_timeout_seconds: default_install_timeout(),
            service_attempts: default_service_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl Default for PhpConfig {
    fn default() -> Self {
        Self {
            pool_candidates: default_pool_candidates(),
            service_pattern: default_fpm_pattern(),
            package_pattern: default_fpm_pattern(),
            cli_link: default_cli_link(),
            cli_binary_pattern: default_cli_binary_pattern(),
            additional_default_versions: Vec::new(),
            additional_isolation_versions: Vec::new(),
        }
    }
}

impl Default for CertificatesConfig {
    fn default() -> Self {
        Self {
            ca_validity_days: default_ca_validity(),
            leaf_validity_days: default_leaf_validity(),
            manage_trust_store: default_manage_trust(),
        }
    }
}

impl LimitsConfig {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.install_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ValetError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ValetError::Config {
            message: format!("Failed to read settings file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| ValetError::Config {
            message: format!("Invalid settings file '{}': {}", path.display(), e),
        })
    }

    /// Load settings if the file exists, otherwise use built-in defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ValetError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ValetError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ValetError::Config {
            message: e.to_string(),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), ValetError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ValetError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ValetError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        if self.php.pool_candidates.is_empty() {
            return Err(ValetError::Config {
                message: "php.pool_candidates must list at least one directory".to_string(),
            });
        }

        if !self.php.service_pattern.contains("{version}")
            && !self.php.service_pattern.contains("{digits}")
        {
            return Err(ValetError::Config {
                message: format!(
                    "php.service_pattern '{}' must contain {{version}} or {{digits}}",
                    self.php.service_pattern
                ),
            });
        }

        if self.limits.service_attempts == 0 {
            return Err(ValetError::Config {
                message: "limits.service_attempts must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.logging.level, "warn");
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.limits.install_timeout_seconds, 1800);
        assert_eq!(settings.php.pool_candidates[0], "/etc/php/{version}/fpm/pool.d");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = Settings::from_toml(
            r#"
            [logging]
            level = "debug"

            [php]
            pool_candidates = ["/opt/php/{digits}/pool"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.logging.format, "pretty");
        assert_eq!(settings.php.pool_candidates, vec!["/opt/php/{digits}/pool"]);
        assert_eq!(settings.php.service_pattern, "php{version}-fpm");
        assert_eq!(settings.certificates.leaf_validity_days, 368);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let result = Settings::from_toml("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ValetError::Config { .. })));
    }

    #[test]
    fn test_service_pattern_requires_placeholder() {
        let result = Settings::from_toml("[php]\nservice_pattern = \"php-fpm\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings.limits.service_attempts, 3);
    }
}
