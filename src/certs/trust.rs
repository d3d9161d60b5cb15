//! Trust anchor installation for the local root CA.
//!
//! The root is copied into the OS bundle and registered with every NSS
//! database (Chromium's `~/.pki/nssdb`, Firefox profiles). Callers treat
//! failures as warnings.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SubprocessBuilder};
use crate::filesystem::Filesystem;

/// Installs and removes the root CA from the machine's trust stores.
pub trait TrustStore: Send + Sync {
    /// Trust the PEM at `pem` under `name`.
    fn install(&self, pem: &Path, name: &str) -> ValetResult<()>;

    /// Stop trusting the certificate installed under `name`.
    fn uninstall(&self, name: &str) -> ValetResult<()>;
}

/// Anchor directories with the command that rebuilds the bundle, in probe
/// order.
const OS_ANCHORS: &[(&str, &str, &[&str])] = &[
    ("/usr/local/share/ca-certificates", "update-ca-certificates", &[]),
    ("/etc/pki/ca-trust/source/anchors", "update-ca-trust", &["extract"]),
    ("/etc/ca-certificates/trust-source/anchors", "trust", &["extract-compat"]),
];

/// OS bundle plus NSS databases of the developer user.
pub struct SystemTrustStore {
    runner: Arc<dyn CommandRunner>,
    fs: Arc<Filesystem>,
    timeout: Duration,
}

impl SystemTrustStore {
    pub fn new(runner: Arc<dyn CommandRunner>, fs: Arc<Filesystem>, timeout: Duration) -> Self {
        Self {
            runner,
            fs,
            timeout,
        }
    }

    fn os_anchor(&self) -> Option<(PathBuf, &'static str, &'static [&'static str])> {
        OS_ANCHORS
            .iter()
            .find(|(dir, _, _)| self.fs.is_dir(Path::new(dir)))
            .map(|(dir, cmd, args)| (PathBuf::from(dir), *cmd, *args))
    }

    /// NSS databases of the developer user: `~/.pki/nssdb` and every Firefox
    /// profile holding a `cert9.db`.
    fn nss_databases(&self) -> ValetResult<Vec<PathBuf>> {
        let Some(owner) = self.fs.owner() else {
            return Ok(Vec::new());
        };

        let mut databases = Vec::new();
        let chromium = owner.home.join(".pki/nssdb");
        if self.fs.is_dir(&chromium) {
            databases.push(chromium);
        }

        for profiles in [".mozilla/firefox", "snap/firefox/common/.mozilla/firefox"] {
            let root = owner.home.join(profiles);
            for entry in self.fs.scandir(&root)? {
                let profile = root.join(entry);
                if self.fs.exists(&profile.join("cert9.db")) {
                    databases.push(profile);
                }
            }
        }
        Ok(databases)
    }

    fn run(&self, command: SubprocessBuilder, what: &str) -> ValetResult<()> {
        let result = self.runner.run(command.timeout(self.timeout))?;
        if result.success {
            Ok(())
        } else {
            Err(ValetError::execution_failed(format!(
                "{} failed with {}",
                what,
                result.diagnostic()
            )))
        }
    }

    fn certutil(&self) -> SubprocessBuilder {
        let user = self.fs.owner().map(|o| o.name.as_str());
        SubprocessBuilder::new("certutil").as_user(user)
    }
}

impl TrustStore for SystemTrustStore {
    fn install(&self, pem: &Path, name: &str) -> ValetResult<()> {
        let mut failures = Vec::new();

        match self.os_anchor() {
            Some((dir, update, args)) => {
                let target = dir.join(format!("{}.crt", name));
                debug!(target = %target.display(), "Installing root CA into OS bundle");
                let installed = self
                    .fs
                    .copy(pem, &target)
                    .and_then(|_| self.run(SubprocessBuilder::new(update).args(args), update));
                match installed {
                    Ok(()) => info!(name, path = %target.display(), "Root CA installed in system trust store"),
                    Err(e) => failures.push(e.to_string()),
                }
            }
            None => warn!("No known OS trust anchor directory found"),
        }

        let pem_arg = pem.display().to_string();
        for db in self.nss_databases()? {
            let db_arg = format!("sql:{}", db.display());
            // Replace a stale entry from an earlier root.
            let _ = self.run(self.certutil().args(["-D", "-d", &db_arg, "-n", name]), "certutil -D");
            let added = self.run(
                self.certutil()
                    .args(["-A", "-d", &db_arg, "-t", "TC,C,C", "-n", name, "-i", &pem_arg]),
                "certutil -A",
            );
            match added {
                Ok(()) => debug!(database = %db.display(), "Root CA added to NSS database"),
                Err(e) => failures.push(e.to_string()),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValetError::execution_failed(failures.join("; ")))
        }
    }

    fn uninstall(&self, name: &str) -> ValetResult<()> {
        let mut failures = Vec::new();

        if let Some((dir, update, args)) = self.os_anchor() {
            let target = dir.join(format!("{}.crt", name));
            if self.fs.remove(&target)? {
                if let Err(e) = self.run(SubprocessBuilder::new(update).args(args), update) {
                    failures.push(e.to_string());
                }
            }
        }

        for db in self.nss_databases()? {
            let db_arg = format!("sql:{}", db.display());
            if let Err(e) = self.run(self.certutil().args(["-D", "-d", &db_arg, "-n", name]), "certutil -D") {
                debug!(database = %db.display(), error = %e, "Root CA not removed from NSS database");
            }
        }

        if failures.is_empty() {
            info!(name, "Root CA removed from trust stores");
            Ok(())
        } else {
            Err(ValetError::execution_failed(failures.join("; ")))
        }
    }
}

/// Trust store that does nothing, for `manage_trust_store = false`.
pub struct DisabledTrustStore;

impl TrustStore for DisabledTrustStore {
    fn install(&self, _pem: &Path, name: &str) -> ValetResult<()> {
        debug!(name, "Trust store management disabled");
        Ok(())
    }

    fn uninstall(&self, _name: &str) -> ValetResult<()> {
        Ok(())
    }
}
