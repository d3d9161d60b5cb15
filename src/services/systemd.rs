//! Systemd service manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::error::{ValetError, ValetResult};
use crate::executor::{retry, CommandRunner, SubprocessBuilder, SubprocessResult};

use super::traits::ServiceManager;

/// Drives services through `systemctl`.
pub struct Systemd {
    runner: Arc<dyn CommandRunner>,
    limits: LimitsConfig,
}

impl Systemd {
    pub fn new(runner: Arc<dyn CommandRunner>, limits: LimitsConfig) -> Self {
        Self { runner, limits }
    }

    fn systemctl(&self, action: &str, service: &str) -> ValetResult<SubprocessResult> {
        self.runner.run(
            SubprocessBuilder::new("systemctl")
                .args([action, service])
                .timeout(self.limits.command_timeout()),
        )
    }

    fn control(&self, action: &'static str, past: &'static str, service: &str) -> ValetResult<()> {
        debug!(service = %service, action, "Controlling service");

        let result = self.systemctl(action, service)?;
        if !result.success {
            warn!(
                service = %service,
                action,
                stderr = %result.stderr.trim(),
                "Service operation failed"
            );
            return Err(ValetError::ServiceUnavailable {
                service: service.to_string(),
                action: past,
                exit_code: result.exit_code,
                output: result.diagnostic(),
            });
        }

        info!(service = %service, action, "Service {}", past);
        Ok(())
    }

    /// Start-like operations get `limits.service_attempts` tries.
    fn control_with_retry(
        &self,
        action: &'static str,
        past: &'static str,
        service: &str,
    ) -> ValetResult<()> {
        retry(
            self.limits.service_attempts,
            self.limits.retry_delay(),
            |_| self.control(action, past, service),
        )
    }
}

impl ServiceManager for Systemd {
    fn start(&self, service: &str) -> ValetResult<()> {
        self.control_with_retry("start", "started", service)
    }

    fn stop(&self, service: &str) -> ValetResult<()> {
        self.control("stop", "stopped", service)
    }

    fn restart(&self, service: &str) -> ValetResult<()> {
        self.control_with_retry("restart", "restarted", service)
    }

    fn enable(&self, service: &str) -> ValetResult<()> {
        self.control("enable", "enabled", service)
    }

    fn disable(&self, service: &str) -> ValetResult<()> {
        self.control("disable", "disabled", service)
    }

    fn disabled(&self, service: &str) -> ValetResult<bool> {
        let result = self.systemctl("is-enabled", service)?;
        Ok(!result.success)
    }

    fn print_status(&self, service: &str) -> ValetResult<String> {
        let result = self.systemctl("status", service)?;
        Ok(result.stdout)
    }
}
