//! Package manager selection.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::LimitsConfig;
use crate::error::{ValetError, ValetResult};
use crate::executor::CommandRunner;

use super::apt::Apt;
use super::dnf::Dnf;
use super::traits::PackageManager;

/// Package managers in probe order: the first binary found wins.
const CANDIDATES: &[(&str, &str)] = &[("apt", "/usr/bin/apt-get"), ("dnf", "/usr/bin/dnf")];

/// Pick the package manager of this machine.
pub fn detect_package_manager(
    runner: Arc<dyn CommandRunner>,
    limits: LimitsConfig,
) -> ValetResult<Arc<dyn PackageManager>> {
    detect_in(Path::new("/"), runner, limits)
}

fn detect_in(
    root: &Path,
    runner: Arc<dyn CommandRunner>,
    limits: LimitsConfig,
) -> ValetResult<Arc<dyn PackageManager>> {
    for (name, binary) in CANDIDATES {
        if root.join(binary.trim_start_matches('/')).exists() {
            info!(package_manager = name, "Package manager detected");
            return Ok(match *name {
                "apt" => Arc::new(Apt::new(runner, limits)),
                _ => Arc::new(Dnf::new(runner, limits)),
            });
        }
    }

    Err(ValetError::Config {
        message: format!(
            "No supported package manager found (looked for {})",
            CANDIDATES
                .iter()
                .map(|(_, b)| *b)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    })
}
