//! Service and package manager adapter traits.
//!
//! The engine only ever speaks in abstract operations ("restart php8.2-fpm",
//! "install php7.4-fpm"); distro-specific tooling lives behind these traits.

use crate::error::ValetResult;

/// Controls system services.
///
/// # Example
///
/// ```ignore
/// services.enable("php8.2-fpm")?;
/// services.restart("php8.2-fpm")?;
/// if !services.disabled("nginx")? {
///     services.restart("nginx")?;
/// }
/// ```
pub trait ServiceManager: Send + Sync {
    fn start(&self, service: &str) -> ValetResult<()>;

    fn stop(&self, service: &str) -> ValetResult<()>;

    fn restart(&self, service: &str) -> ValetResult<()>;

    fn enable(&self, service: &str) -> ValetResult<()>;

    fn disable(&self, service: &str) -> ValetResult<()>;

    /// Whether the service is disabled (or unknown to the service manager).
    fn disabled(&self, service: &str) -> ValetResult<bool>;

    /// Human-readable status report.
    fn print_status(&self, service: &str) -> ValetResult<String>;
}

/// Installs system packages.
pub trait PackageManager: Send + Sync {
    /// Short name of the backing tool (e.g. "apt").
    fn name(&self) -> &'static str;

    fn installed(&self, package: &str) -> ValetResult<bool>;

    /// Install the package, failing with `PackageInstallFailed` on any error.
    fn install_or_fail(&self, package: &str) -> ValetResult<()>;

    /// Install the package only if it is not already present.
    fn ensure_installed(&self, package: &str) -> ValetResult<()> {
        if self.installed(package)? {
            return Ok(());
        }
        self.install_or_fail(package)
    }
}
