//! Component wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::certs::{CertificateAuthority, DisabledTrustStore, SystemTrustStore, TrustStore};
use crate::config::{ConfigStore, Settings};
use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SystemRunner};
use crate::filesystem::{Filesystem, Owner};
use crate::php::VersionRegistry;
use crate::reconcile::Reconciler;
use crate::services::{detect_package_manager, NginxService, PackageManager, ServiceManager, Systemd};
use crate::sites::SiteConfigStore;
use crate::templates::TemplateEngine;

/// The machine-facing side of the engine.
#[derive(Clone)]
pub struct Adapters {
    pub runner: Arc<dyn CommandRunner>,
    pub services: Arc<dyn ServiceManager>,
    pub packages: Arc<dyn PackageManager>,
    pub trust: Arc<dyn TrustStore>,
    pub fs: Arc<Filesystem>,
}

impl Adapters {
    /// Real adapters for this machine.
    pub fn system(settings: &Settings) -> ValetResult<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let fs = Arc::new(Filesystem::new(Owner::detect()));
        let services: Arc<dyn ServiceManager> =
            Arc::new(Systemd::new(runner.clone(), settings.limits.clone()));
        let packages = detect_package_manager(runner.clone(), settings.limits.clone())?;
        let trust: Arc<dyn TrustStore> = if settings.certificates.manage_trust_store {
            Arc::new(SystemTrustStore::new(
                runner.clone(),
                fs.clone(),
                settings.limits.command_timeout(),
            ))
        } else {
            Arc::new(DisabledTrustStore)
        };

        Ok(Self {
            runner,
            services,
            packages,
            trust,
            fs,
        })
    }
}

/// Every component, constructed once per invocation.
pub struct Engine {
    pub settings: Settings,
    pub home: PathBuf,
    pub config: Arc<ConfigStore>,
    pub ca: Arc<CertificateAuthority>,
    pub sites: Arc<SiteConfigStore>,
    pub php: Arc<VersionRegistry>,
    pub nginx: Arc<NginxService>,
    pub reconciler: Reconciler,
}

impl Engine {
    /// Engine backed by the real system.
    pub fn from_settings(settings: Settings) -> ValetResult<Self> {
        let adapters = Adapters::system(&settings)?;
        let home = resolve_home(&settings, &adapters.fs)?;
        Self::with_adapters(settings, &home, adapters)
    }

    /// Engine rooted at `home` using the given adapters.
    pub fn with_adapters(settings: Settings, home: &Path, adapters: Adapters) -> ValetResult<Self> {
        debug!(home = %home.display(), "Wiring engine");

        let templates = TemplateEngine::with_overrides(&home.join("stubs"))?;
        let config = Arc::new(ConfigStore::new(home.join("config.json"), adapters.fs.clone()));

        let ca = Arc::new(CertificateAuthority::new(
            home,
            adapters.runner.clone(),
            adapters.fs.clone(),
            templates.clone(),
            adapters.trust.clone(),
            settings.limits.command_timeout(),
        ));

        let server_script = settings
            .paths
            .server_script
            .clone()
            .unwrap_or_else(|| home.join("server.php"));
        let sites = Arc::new(SiteConfigStore::new(
            home,
            settings.paths.nginx_catch_all.clone(),
            server_script,
            adapters.fs.clone(),
            templates.clone(),
            ca.clone(),
        ));

        let nginx = Arc::new(NginxService::new(
            adapters.services.clone(),
            adapters.runner.clone(),
        ));

        let php = Arc::new(VersionRegistry::new(
            &settings.php,
            home,
            adapters.fs.clone(),
            templates,
            adapters.packages.clone(),
            adapters.services.clone(),
            nginx.clone(),
            sites.clone(),
            config.clone(),
        ));

        let reconciler = Reconciler::new(
            config.clone(),
            sites.clone(),
            ca.clone(),
            php.clone(),
            nginx.clone(),
            settings.certificates.clone(),
        );

        Ok(Self {
            settings,
            home: home.to_path_buf(),
            config,
            ca,
            sites,
            php,
            nginx,
            reconciler,
        })
    }
}

/// `paths.home` from the settings, else `~/.valet` of the developer user.
fn resolve_home(settings: &Settings, fs: &Filesystem) -> ValetResult<PathBuf> {
    if let Some(home) = &settings.paths.home {
        return Ok(home.clone());
    }
    if let Some(owner) = fs.owner() {
        return Ok(owner.home.join(".valet"));
    }
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".valet"))
        .ok_or_else(|| ValetError::Config {
            message: "Cannot determine the Valet home directory; set paths.home".to_string(),
        })
}
