//! PHP-FPM unit and package naming.

use crate::config::PhpConfig;
use crate::php::version_digits;

/// Maps a canonical PHP version to its FPM unit, package and CLI binary.
///
/// Names come from patterns in the settings, so a distro that calls the unit
/// `php82-php-fpm` only needs a different pattern.
#[derive(Debug, Clone)]
pub struct PhpFpmService {
    service_pattern: String,
    package_pattern: String,
    cli_binary_pattern: String,
}

impl PhpFpmService {
    pub fn new(config: &PhpConfig) -> Self {
        Self {
            service_pattern: config.service_pattern.clone(),
            package_pattern: config.package_pattern.clone(),
            cli_binary_pattern: config.cli_binary_pattern.clone(),
        }
    }

    /// Service unit for a version, e.g. `php8.2-fpm`.
    pub fn service_name(&self, version: &str) -> String {
        expand(&self.service_pattern, version)
    }

    /// FPM package for a version.
    pub fn package_name(&self, version: &str) -> String {
        expand(&self.package_pattern, version)
    }

    /// Versioned CLI binary, e.g. `/usr/bin/php8.2`.
    pub fn cli_binary(&self, version: &str) -> String {
        expand(&self.cli_binary_pattern, version)
    }
}

/// Expand `{version}` and `{digits}` placeholders.
pub fn expand(pattern: &str, version: &str) -> String {
    pattern
        .replace("{version}", version)
        .replace("{digits}", &version_digits(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patterns() {
        let fpm = PhpFpmService::new(&PhpConfig::default());
        assert_eq!(fpm.service_name("8.2"), "php8.2-fpm");
        assert_eq!(fpm.package_name("7.4"), "php7.4-fpm");
        assert_eq!(fpm.cli_binary("8.1"), "/usr/bin/php8.1");
    }

    #[test]
    fn test_digit_pattern() {
        let config = PhpConfig {
            service_pattern: "php{digits}-php-fpm".to_string(),
            ..PhpConfig::default()
        };
        let fpm = PhpFpmService::new(&config);
        assert_eq!(fpm.service_name("8.3"), "php83-php-fpm");
    }
}
