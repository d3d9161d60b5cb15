//! FPM pool directory discovery.

use std::path::PathBuf;

use tracing::debug;

use crate::error::{ValetError, ValetResult};
use crate::services::expand;

use super::version::version_digits;

/// Finds where a distro keeps the FPM pool files of a PHP version.
///
/// Debian uses `/etc/php/8.2/fpm/pool.d`, Remi `/etc/opt/remi/php82/php-fpm.d`,
/// Arch a single `/etc/php/php-fpm.d`; the candidates are probed in order.
#[derive(Debug, Clone)]
pub struct PoolLocator {
    candidates: Vec<String>,
}

impl PoolLocator {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    /// Candidate directories for a version, placeholders expanded.
    pub fn candidates_for(&self, version: &str) -> Vec<PathBuf> {
        self.candidates
            .iter()
            .map(|pattern| PathBuf::from(expand(pattern, version)))
            .collect()
    }

    /// First existing candidate directory.
    pub fn pool_config_directory(&self, version: &str) -> ValetResult<PathBuf> {
        let candidates = self.candidates_for(version);
        for dir in &candidates {
            if dir.is_dir() {
                debug!(version, directory = %dir.display(), "Found FPM pool directory");
                return Ok(dir.clone());
            }
        }

        Err(ValetError::PoolPathNotFound {
            version: version.to_string(),
            tried: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// File name of the Valet pool inside the pool directory.
pub fn pool_file_name(version: &str) -> String {
    format!("valet{}.conf", version_digits(version))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_existing_candidate_wins() {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().display().to_string();
        let locator = PoolLocator::new(vec![
            format!("{}/php/{{version}}/fpm/pool.d", base),
            format!("{}/remi/php{{digits}}/php-fpm.d", base),
            format!("{}/php-fpm.d", base),
        ]);

        std::fs::create_dir_all(root.path().join("remi/php74/php-fpm.d")).unwrap();
        std::fs::create_dir_all(root.path().join("php-fpm.d")).unwrap();

        assert_eq!(
            locator.pool_config_directory("7.4").unwrap(),
            root.path().join("remi/php74/php-fpm.d")
        );
        assert_eq!(
            locator.pool_config_directory("8.2").unwrap(),
            root.path().join("php-fpm.d")
        );
    }

    #[test]
    fn test_none_existing_lists_tried_paths() {
        let root = tempfile::tempdir().unwrap();
        let locator = PoolLocator::new(vec![format!(
            "{}/php/{{version}}/fpm/pool.d",
            root.path().display()
        )]);

        match locator.pool_config_directory("8.1") {
            Err(ValetError::PoolPathNotFound { version, tried }) => {
                assert_eq!(version, "8.1");
                assert!(tried.ends_with("php/8.1/fpm/pool.d"));
            }
            other => panic!("unexpected result: {:?}", other.map(|p| p.display().to_string())),
        }
    }

    #[test]
    fn test_pool_file_name() {
        assert_eq!(pool_file_name("8.2"), "valet82.conf");
    }
}
