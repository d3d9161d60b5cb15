//! Debian/Ubuntu package manager.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::LimitsConfig;
use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SubprocessBuilder};

use super::traits::PackageManager;

/// Installs packages with `apt-get`, queries with `dpkg-query`.
pub struct Apt {
    runner: Arc<dyn CommandRunner>,
    limits: LimitsConfig,
}

impl Apt {
    pub fn new(runner: Arc<dyn CommandRunner>, limits: LimitsConfig) -> Self {
        Self { runner, limits }
    }
}

impl PackageManager for Apt {
    fn name(&self) -> &'static str {
        "apt"
    }

    fn installed(&self, package: &str) -> ValetResult<bool> {
        let result = self.runner.run(
            SubprocessBuilder::new("dpkg-query")
                .args(["-W", "-f=${Status}", package])
                .timeout(self.limits.command_timeout()),
        )?;
        Ok(result.success && result.stdout.contains("install ok installed"))
    }

    fn install_or_fail(&self, package: &str) -> ValetResult<()> {
        debug!(package = %package, "Installing package with apt-get");

        let result = self.runner.run(
            SubprocessBuilder::new("apt-get")
                .args([
                    "install",
                    "-y",
                    "--no-install-recommends",
                    "-o",
                    "Dpkg::Options::=--force-confdef",
                    "-o",
                    "Dpkg::Options::=--force-confold",
                    package,
                ])
                .env("DEBIAN_FRONTEND", "noninteractive")
                .timeout(self.limits.install_timeout()),
        )?;

        if !result.success {
            warn!(package = %package, stderr = %result.stderr.trim(), "apt-get install failed");
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SubprocessResult;
    use std::sync::Mutex;

    struct ScriptedRunner {
        responses: Mutex<Vec<SubprocessResult>>,
        seen: Mutex<Vec<SubprocessBuilder>>,
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, command: SubprocessBuilder) -> ValetResult<SubprocessResult> {
            self.seen.lock().unwrap().push(command);
            Ok(self.responses.lock().unwrap().remove(0))
        }
    }

    fn apt(responses: Vec<SubprocessResult>) -> (Apt, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner {
            responses: Mutex::new(responses),
            seen: Mutex::new(Vec::new()),
        });
        (Apt::new(runner.clone(), LimitsConfig::default()), runner)
    }

    #[test]
    fn test_installed_parses_dpkg_status() {
        let mut ok = SubprocessResult::ok();
        ok.stdout = "install ok installed".to_string();
        let (apt, _) = apt(vec![ok, SubprocessResult::failed(1, "no packages found")]);

        assert!(apt.installed("php8.2-fpm").unwrap());
        assert!(!apt.installed("php5.6-fpm").unwrap());
    }

    #[test]
    fn test_install_uses_install_timeout() {
        let (apt, runner) = apt(vec![SubprocessResult::ok()]);
        apt.install_or_fail("php7.4-fpm").unwrap();

        let seen = runner.seen.lock().unwrap();
        assert_eq!(seen[0].program(), "apt-get");
        assert_eq!(seen[0].arguments().last().map(String::as_str), Some("php7.4-fpm"));
        assert_eq!(seen[0].timeout_duration(), LimitsConfig::default().install_timeout());
    }

    #[test]
    fn test_install_failure_is_error() {
        let (apt, _) = apt(vec![SubprocessResult::failed(
            100,
            "E: Unable to locate package php9.9-fpm",
        )]);
        let err = apt.install_or_fail("php9.9-fpm").unwrap_err();
        match err {
            ValetError::PackageInstallFailed { exit_code, output, .. } => {
                assert_eq!(exit_code, Some(100));
                assert!(output.contains("Unable to locate package"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ensure_installed_skips_present_package() {
        let mut ok = SubprocessResult::ok();
        ok.stdout = "install ok installed".to_string();
        let (apt, runner) = apt(vec![ok]);

        apt.ensure_installed("nginx").unwrap();
        assert_eq!(runner.seen.lock().unwrap().len(), 1);
    }
}
