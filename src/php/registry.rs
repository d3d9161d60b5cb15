//! PHP version lifecycle: install, pin, switch, stop.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{ConfigStore, PhpConfig};
use crate::error::{ValetError, ValetResult};
use crate::filesystem::Filesystem;
use crate::services::{NginxService, PackageManager, PhpFpmService, ServiceManager};
use crate::sites::{RegenerationReport, SiteConfigStore};
use crate::templates::TemplateEngine;

use super::pool::{pool_file_name, PoolLocator};
use super::version::{normalize, socket_path, version_digits, SupportedVersions};

/// Options of a default-version switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchOptions {
    /// Install the FPM package when it is missing.
    pub install_if_missing: bool,
    /// Point the system `php` binary at the new version.
    pub update_cli: bool,
}

impl Default for SwitchOptions {
    fn default() -> Self {
        Self {
            install_if_missing: true,
            update_cli: false,
        }
    }
}

/// What a successful switch did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitchOutcome {
    pub previous: String,
    pub current: String,
    pub stopped_previous: bool,
    pub cli_linked: bool,
    pub report: RegenerationReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchState {
    Requested,
    Installing,
    InstallFailed,
    RolledBack,
    Installed,
    Rewriting,
    Restarting,
    StoppingUnused,
    Done,
}

/// Knows which PHP versions exist, which are in use, and how to move the
/// default between them.
pub struct VersionRegistry {
    home: PathBuf,
    supported: SupportedVersions,
    pools: PoolLocator,
    fpm: PhpFpmService,
    cli_link: PathBuf,
    fs: Arc<Filesystem>,
    templates: TemplateEngine,
    packages: Arc<dyn PackageManager>,
    services: Arc<dyn ServiceManager>,
    nginx: Arc<NginxService>,
    sites: Arc<SiteConfigStore>,
    config: Arc<ConfigStore>,
}

impl VersionRegistry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        php: &PhpConfig,
        home: &Path,
        fs: Arc<Filesystem>,
        templates: TemplateEngine,
        packages: Arc<dyn PackageManager>,
        services: Arc<dyn ServiceManager>,
        nginx: Arc<NginxService>,
        sites: Arc<SiteConfigStore>,
        config: Arc<ConfigStore>,
    ) -> Self {
        Self {
            home: home.to_path_buf(),
            supported: SupportedVersions::new(php),
            pools: PoolLocator::new(php.pool_candidates.clone()),
            fpm: PhpFpmService::new(php),
            cli_link: php.cli_link.clone(),
            fs,
            templates,
            packages,
            services,
            nginx,
            sites,
            config,
        }
    }

    pub fn supported(&self) -> &SupportedVersions {
        &self.supported
    }

    pub fn normalize(&self, input: &str) -> ValetResult<String> {
        normalize(input)
    }

    pub fn socket_path(&self, version: &str) -> PathBuf {
        socket_path(&self.home, version)
    }

    pub fn pool_config_directory(&self, version: &str) -> ValetResult<PathBuf> {
        self.pools.pool_config_directory(version)
    }

    pub fn fpm_service_name(&self, version: &str) -> String {
        self.fpm.service_name(version)
    }

    pub fn fpm_package_name(&self, version: &str) -> String {
        self.fpm.package_name(version)
    }

    /// The default version plus every version an isolated site is pinned to.
    ///
    /// Recomputed from disk on every call.
    pub fn utilized_versions(&self) -> ValetResult<BTreeSet<String>> {
        let mut versions = BTreeSet::new();

        let default = self.config.read()?.php_version;
        versions.insert(normalize(&default).unwrap_or(default));

        for (host, pinned) in self.sites.isolated_sites()? {
            match normalize(&pinned) {
                Ok(version) => {
                    versions.insert(version);
                }
                Err(e) => warn!(host = %host, error = %e, "Ignoring unreadable isolation marker"),
            }
        }

        debug!(versions = ?versions, "Utilized PHP versions");
        Ok(versions)
    }

    /// Make a version usable: FPM package present and Valet pool written.
    pub fn install(&self, version: &str) -> ValetResult<PathBuf> {
        self.packages
            .ensure_installed(&self.fpm.package_name(version))?;
        self.write_pool(version)
    }

    /// Write the Valet FPM pool of a version. Returns the pool file path.
    pub fn write_pool(&self, version: &str) -> ValetResult<PathBuf> {
        let dir = self.pools.pool_config_directory(version)?;
        let path = dir.join(pool_file_name(version));

        let (user, group) = match self.fs.owner() {
            Some(owner) => (owner.name.clone(), owner.group_name()),
            None => ("www-data".to_string(), "www-data".to_string()),
        };
        let content = self.templates.render(
            "fpm.valet.conf.tera",
            &json!({
                "digits": version_digits(version),
                "user": user,
                "group": group,
                "socket": self.socket_path(version).display().to_string(),
            }),
        )?;

        self.fs.write(&path, &content)?;
        info!(version, path = %path.display(), "FPM pool written");
        Ok(path)
    }

    pub fn restart(&self, version: &str) -> ValetResult<()> {
        self.services.restart(&self.fpm.service_name(version))
    }

    /// Stop the FPM service of `version` unless something still uses it.
    /// Returns whether it was stopped.
    pub fn stop_if_unused(&self, version: &str) -> ValetResult<bool> {
        let version = normalize(version)?;
        if self.utilized_versions()?.contains(&version) {
            debug!(version = %version, "PHP version still in use, keeping FPM running");
            return Ok(false);
        }

        self.services.stop(&self.fpm.service_name(&version))?;
        info!(version = %version, "Stopped unused PHP-FPM");
        Ok(true)
    }

    /// Point the system `php` link at the versioned binary.
    pub fn link_cli(&self, version: &str) -> ValetResult<bool> {
        let binary = PathBuf::from(self.fpm.cli_binary(version));
        if !self.fs.exists(&binary) {
            warn!(binary = %binary.display(), "PHP CLI binary not found, leaving php link alone");
            return Ok(false);
        }
        self.fs.symlink(&binary, &self.cli_link)?;
        info!(link = %self.cli_link.display(), target = %binary.display(), "PHP CLI linked");
        Ok(true)
    }

    /// Make `requested` the default PHP version for every non-isolated site.
    ///
    /// If the package install fails the stored default is left at (or put
    /// back to) the previous version and the error is returned. Failures
    /// after that point are returned as is; re-running the switch or
    /// `regenerate` repairs the state.
    pub fn switch_default(
        &self,
        requested: &str,
        options: SwitchOptions,
    ) -> ValetResult<SwitchOutcome> {
        let version = self.supported.validate_default(&normalize(requested)?)?;
        self.transition(&version, SwitchState::Requested);

        let stored = self.config.read()?.php_version;
        let previous = normalize(&stored).unwrap_or(stored);

        self.transition(&version, SwitchState::Installing);
        if let Err(e) = self.install_for_switch(&version, options.install_if_missing) {
            self.transition(&version, SwitchState::InstallFailed);
            warn!(version = %version, previous = %previous, error = %e, "Install failed, keeping previous default");
            self.config.update(|c| c.php_version = previous.clone())?;
            self.transition(&version, SwitchState::RolledBack);
            return Err(e);
        }
        self.transition(&version, SwitchState::Installed);

        let config = self.config.update(|c| c.php_version = version.clone())?;

        self.transition(&version, SwitchState::Rewriting);
        let report = self.sites.regenerate_all(&config.parameters())?;

        self.transition(&version, SwitchState::Restarting);
        let service = self.fpm.service_name(&version);
        self.services.enable(&service)?;
        self.services.restart(&service)?;
        self.nginx.restart()?;

        self.transition(&version, SwitchState::StoppingUnused);
        let stopped_previous = previous != version && self.stop_if_unused(&previous)?;

        let cli_linked = options.update_cli && self.link_cli(&version)?;

        self.transition(&version, SwitchState::Done);
        info!(from = %previous, to = %version, "Default PHP version switched");

        Ok(SwitchOutcome {
            previous,
            current: version,
            stopped_previous,
            cli_linked,
            report,
        })
    }

    fn install_for_switch(&self, version: &str, install_if_missing: bool) -> ValetResult<()> {
        let package = self.fpm.package_name(version);
        if !self.packages.installed(&package)? {
            if !install_if_missing {
                return Err(ValetError::PackageInstallFailed {
                    package,
                    exit_code: None,
                    output: "package is not installed and installation was disabled".to_string(),
                });
            }
            self.packages.install_or_fail(&package)?;
        }
        self.write_pool(version)?;
        Ok(())
    }

    fn transition(&self, version: &str, state: SwitchState) {
        debug!(version, state = ?state, "Default version switch");
    }
}
