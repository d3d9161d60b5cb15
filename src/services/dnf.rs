//! Fedora/RHEL package manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SubprocessBuilder};

use super::traits::PackageManager;

/// Installs packages with `dnf`, queries with `rpm`.
pub struct Dnf {
    runner: Arc<dyn CommandRunner>,
    limits: LimitsConfig,
}

impl Dnf {
    pub fn new(runner: Arc<dyn CommandRunner>, limits: LimitsConfig) -> Self {
        Self { runner, limits }
    }
}

impl PackageManager for Dnf {
    fn name(&self) -> &'static str {
        "dnf"
    }

    fn installed(&self, package: &str) -> ValetResult<bool> {
        let result = self.runner.run(
            SubprocessBuilder::new("rpm")
                .args(["-q", package])
                .timeout(self.limits.command_timeout()),
        )?;
        Ok(result.success)
    }

    fn install_or_fail(&self, package: &str) -> ValetResult<()> {
        debug!(package = %package, "Installing package with dnf");

        let result = self.runner.run(
            SubprocessBuilder::new("dnf")
                .args(["install", "-y", package])
                .timeout(self.limits.install_timeout()),
        )?;

        if !result.success {
            warn!(package = %package, stderr = %result.stderr.trim(), "dnf install failed");
            return Err(ValetError::PackageInstallFailed {
                package: package.to_string(),
                exit_code: result.exit_code,
                output: result.diagnostic(),
            });
        }

        info!(package = %package, "Package installed");
        Ok(())
    }
}
