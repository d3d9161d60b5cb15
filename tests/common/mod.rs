//! Shared fakes for integration tests.
//!
//! Every adapter the engine talks to is replaced by an in-memory recorder, so
//! tests run against a temporary Valet home without touching the machine.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use valet::certs::DisabledTrustStore;
use valet::config::Settings;
use valet::engine::{Adapters, Engine};
use valet::error::{ValetError, ValetResult};
use valet::executor::{CommandRunner, SubprocessBuilder, SubprocessResult};
use valet::filesystem::Filesystem;
use valet::services::{PackageManager, ServiceManager};

/// Versions that get a pool directory in the fake `/etc`.
const POOL_VERSIONS: &[&str] = &["5.6", "7.0", "7.1", "7.2", "7.3", "7.4", "8.0", "8.1", "8.2", "8.3", "8.4"];

/// Records service calls as `(action, service)`.
#[derive(Default)]
pub struct RecordingServices {
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingServices {
    fn record(&self, action: &str, service: &str) -> ValetResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push((action.to_string(), service.to_string()));
        Ok(())
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, action: &str, service: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, s)| a == action && s == service)
            .count()
    }
}

impl ServiceManager for RecordingServices {
    fn start(&self, service: &str) -> ValetResult<()> {
        self.record("start", service)
    }

    fn stop(&self, service: &str) -> ValetResult<()> {
        self.record("stop", service)
    }

    fn restart(&self, service: &str) -> ValetResult<()> {
        self.record("restart", service)
    }

    fn enable(&self, service: &str) -> ValetResult<()> {
        self.record("enable", service)
    }

    fn disable(&self, service: &str) -> ValetResult<()> {
        self.record("disable", service)
    }

    fn disabled(&self, _service: &str) -> ValetResult<bool> {
        Ok(false)
    }

    fn print_status(&self, service: &str) -> ValetResult<String> {
        Ok(format!("{}: active", service))
    }
}

/// Package manager with a configurable set of installed and broken packages.
#[derive(Default)]
pub struct FakePackages {
    installed: Mutex<BTreeSet<String>>,
    broken: Mutex<BTreeSet<String>>,
    installs: Mutex<Vec<String>>,
}

impl FakePackages {
    pub fn mark_installed(&self, package: &str) {
        self.installed.lock().unwrap().insert(package.to_string());
    }

    pub fn mark_broken(&self, package: &str) {
        self.broken.lock().unwrap().insert(package.to_string());
    }

    pub fn installs(&self) -> Vec<String> {
        self.installs.lock().unwrap().clone()
    }
}

impl PackageManager for FakePackages {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn installed(&self, package: &str) -> ValetResult<bool> {
        Ok(self.installed.lock().unwrap().contains(package))
    }

    fn install_or_fail(&self, package: &str) -> ValetResult<()> {
        self.installs.lock().unwrap().push(package.to_string());
        if self.broken.lock().unwrap().contains(package) {
            return Err(ValetError::PackageInstallFailed {
                package: package.to_string(),
                exit_code: Some(100),
                output: "E: Unable to locate package".to_string(),
            });
        }
        self.mark_installed(package);
        Ok(())
    }
}

/// Command runner that plays `openssl` by writing placeholder files and
/// accepts everything else.
#[derive(Default)]
pub struct FakeRunner {
    commands: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: SubprocessBuilder) -> ValetResult<SubprocessResult> {
        self.commands.lock().unwrap().push(command.to_string());
        if command.program() == "openssl" {
            for flag in ["-out", "-keyout"] {
                if let Some(path) = command.flag_value(flag) {
                    std::fs::write(path, "-----BEGIN PLACEHOLDER-----\n").unwrap();
                }
            }
            if let Some(serial) = command.flag_value("-CAserial") {
                let next = std::fs::read_to_string(serial)
                    .ok()
                    .and_then(|s| s.trim().parse::<u32>().ok())
                    .map_or(1, |n| n + 1);
                std::fs::write(serial, format!("{:02}\n", next)).unwrap();
            }
        }
        Ok(SubprocessResult::ok())
    }
}

/// A throwaway Valet installation.
pub struct TestEnv {
    pub home: TempDir,
    pub etc: TempDir,
    pub parked: TempDir,
    pub engine: Arc<Engine>,
    pub services: Arc<RecordingServices>,
    pub packages: Arc<FakePackages>,
    pub runner: Arc<FakeRunner>,
}

impl TestEnv {
    pub fn new() -> Self {
        let home = tempfile::tempdir().unwrap();
        let etc = tempfile::tempdir().unwrap();
        let parked = tempfile::tempdir().unwrap();

        for version in POOL_VERSIONS {
            std::fs::create_dir_all(etc.path().join(format!("php/{}/fpm/pool.d", version)))
                .unwrap();
        }
        std::fs::create_dir_all(etc.path().join("bin")).unwrap();

        let settings = Settings::from_toml(&format!(
            r#"
[paths]
home = "{home}"
nginx_catch_all = "{etc}/nginx/sites-available/valet.conf"

[php]
pool_candidates = ["{etc}/php/{{version}}/fpm/pool.d"]
cli_link = "{etc}/bin/php"
cli_binary_pattern = "{etc}/bin/php{{version}}"

[certificates]
manage_trust_store = false
"#,
            home = home.path().display(),
            etc = etc.path().display(),
        ))
        .unwrap();

        let services = Arc::new(RecordingServices::default());
        let packages = Arc::new(FakePackages::default());
        let runner = Arc::new(FakeRunner::default());
        // The default version is assumed to be present already.
        packages.mark_installed("php8.2-fpm");

        let adapters = Adapters {
            runner: runner.clone(),
            services: services.clone(),
            packages: packages.clone(),
            trust: Arc::new(DisabledTrustStore),
            fs: Arc::new(Filesystem::new(None)),
        };
        let engine = Engine::with_adapters(settings, home.path(), adapters).unwrap();

        let parked_path = parked.path().to_path_buf();
        engine
            .config
            .update(|c| c.paths.push(parked_path))
            .unwrap();

        Self {
            home,
            etc,
            parked,
            engine: Arc::new(engine),
            services,
            packages,
            runner,
        }
    }

    /// Create a project directory inside the parked path.
    pub fn park(&self, name: &str) -> PathBuf {
        let dir = self.parked.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn site_file(&self, host: &str) -> PathBuf {
        self.home.path().join("Nginx").join(host)
    }

    pub fn read_site(&self, host: &str) -> String {
        std::fs::read_to_string(self.site_file(host)).unwrap()
    }

    pub fn catch_all(&self) -> String {
        std::fs::read_to_string(self.engine.sites.catch_all_path()).unwrap()
    }

    pub fn cert_exists(&self, host: &str) -> bool {
        self.home
            .path()
            .join("Certificates")
            .join(format!("{}.crt", host))
            .exists()
    }

    pub fn home_path(&self) -> &Path {
        self.home.path()
    }
}
