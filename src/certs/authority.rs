//! Local certificate authority backed by the `openssl` CLI.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SubprocessBuilder};
use crate::filesystem::Filesystem;
use crate::templates::TemplateEngine;

use super::layout::{LeafPaths, RootPaths, CA_FILE_STEM};
use super::trust::TrustStore;

const ROOT_SUBJECT: &str = "/C=US/ST=Local/O=Valet CA Self Signed Organization/OU=Developers/CN=Valet CA Self Signed CN/emailAddress=rootcertificate@valet.local";

/// Key size for root and leaf keys.
const KEY_BITS: &str = "2048";

/// Whether `ensure_root` created a new root or found one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootStatus {
    Created,
    Existing,
}

/// Issues and revokes per-host certificates signed by one self-signed root.
///
/// The certificate directory is the only record of which hosts are secured.
pub struct CertificateAuthority {
    ca_dir: PathBuf,
    certificates_dir: PathBuf,
    runner: Arc<dyn CommandRunner>,
    fs: Arc<Filesystem>,
    templates: TemplateEngine,
    trust: Arc<dyn TrustStore>,
    timeout: Duration,
}

impl CertificateAuthority {
    pub fn new(
        home: &Path,
        runner: Arc<dyn CommandRunner>,
        fs: Arc<Filesystem>,
        templates: TemplateEngine,
        trust: Arc<dyn TrustStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            ca_dir: home.join("CA"),
            certificates_dir: home.join("Certificates"),
            runner,
            fs,
            templates,
            trust,
            timeout,
        }
    }

    pub fn certificates_dir(&self) -> &Path {
        &self.certificates_dir
    }

    pub fn root_paths(&self) -> RootPaths {
        RootPaths::new(&self.ca_dir)
    }

    pub fn leaf_paths(&self, host: &str) -> LeafPaths {
        LeafPaths::new(&self.certificates_dir, host)
    }

    /// Make sure a root CA exists and is trusted.
    ///
    /// An existing root is reused; only its trust anchor is reinstalled.
    pub fn ensure_root(&self, validity_days: u32) -> ValetResult<RootStatus> {
        let root = self.root_paths();

        if self.fs.exists(&root.key) && self.fs.exists(&root.pem) {
            debug!(pem = %root.pem.display(), "Root CA already present");
            self.trust_root(&root);
            return Ok(RootStatus::Existing);
        }

        for stale in root.all() {
            self.fs.remove(stale)?;
        }
        self.fs.ensure_dir_as_user(&self.ca_dir)?;

        let days = validity_days.to_string();
        let command = self.openssl().args([
            "req",
            "-new",
            "-newkey",
            &format!("rsa:{}", KEY_BITS),
            "-days",
            &days,
            "-nodes",
            "-x509",
            "-subj",
            ROOT_SUBJECT,
            "-keyout",
            &root.key.display().to_string(),
            "-out",
            &root.pem.display().to_string(),
        ]);
        if let Err(e) = self.openssl_step(command, "root CA", "root generation") {
            self.fs.remove(&root.key)?;
            self.fs.remove(&root.pem)?;
            return Err(e);
        }

        self.fs.hand_to_user(&root.key);
        self.fs.hand_to_user(&root.pem);
        info!(pem = %root.pem.display(), validity_days, "Root CA created");

        self.trust_root(&root);
        Ok(RootStatus::Created)
    }

    /// Issue a certificate for `host`, replacing any previous one.
    ///
    /// On failure no partial set is left behind.
    pub fn issue_leaf(&self, host: &str, validity_days: u32) -> ValetResult<LeafPaths> {
        let root = self.root_paths();
        if !self.fs.exists(&root.key) || !self.fs.exists(&root.pem) {
            return Err(ValetError::CertificateSigningFailed {
                subject: host.to_string(),
                step: "root lookup",
                exit_code: None,
                output: format!("root CA not found in {}", self.ca_dir.display()),
            });
        }

        let leaf = self.leaf_paths(host);
        self.revoke_leaf(host)?;
        self.fs.ensure_dir_as_user(&self.certificates_dir)?;

        if let Err(e) = self.sign(host, &leaf, &root, validity_days) {
            for path in leaf.all() {
                self.fs.remove(path)?;
            }
            return Err(e);
        }

        for path in leaf.all() {
            self.fs.hand_to_user(path);
        }
        info!(host, crt = %leaf.crt.display(), validity_days, "Certificate issued");
        Ok(leaf)
    }

    fn sign(&self, host: &str, leaf: &LeafPaths, root: &RootPaths, days: u32) -> ValetResult<()> {
        let conf = self
            .templates
            .render("openssl.conf.tera", &json!({ "hostname": host }))?;
        self.fs.write(&leaf.conf, &conf)?;

        let key = leaf.key.display().to_string();
        let csr = leaf.csr.display().to_string();
        let crt = leaf.crt.display().to_string();
        let conf = leaf.conf.display().to_string();

        self.openssl_step(
            self.openssl().args(["genrsa", "-out", &key, KEY_BITS]),
            host,
            "key generation",
        )?;

        self.openssl_step(
            self.openssl().args([
                "req",
                "-new",
                "-key",
                &key,
                "-out",
                &csr,
                "-subj",
                &format!("/CN={}/O=Valet/OU=Developers", host),
                "-config",
                &conf,
            ]),
            host,
            "signing request",
        )?;

        let serial = root.srl.display().to_string();
        let mut args = vec![
            "x509".to_string(),
            "-req".to_string(),
            "-sha256".to_string(),
            "-days".to_string(),
            days.to_string(),
            "-CA".to_string(),
            root.pem.display().to_string(),
            "-CAkey".to_string(),
            root.key.display().to_string(),
        ];
        // The serial file is only ever created once; later leaves increment it.
        if !self.fs.exists(&root.srl) {
            args.push("-CAcreateserial".to_string());
        }
        args.extend(
            [
                "-CAserial", &serial, "-in", &csr, "-out", &crt, "-extensions", "v3_req",
                "-extfile", &conf,
            ]
            .map(String::from),
        );

        self.openssl_step(self.openssl().args(args), host, "signing")?;
        self.fs.hand_to_user(&root.srl);
        Ok(())
    }

    /// Remove every file of the host's certificate. Returns whether anything
    /// was removed.
    pub fn revoke_leaf(&self, host: &str) -> ValetResult<bool> {
        let mut removed = false;
        for path in self.leaf_paths(host).all() {
            removed |= self.fs.remove(path)?;
        }
        if removed {
            info!(host, "Certificate removed");
        }
        Ok(removed)
    }

    /// Hosts holding a complete certificate set.
    pub fn list_secured(&self) -> ValetResult<BTreeSet<String>> {
        Ok(self
            .fs
            .scandir(&self.certificates_dir)?
            .into_iter()
            .filter_map(|name| name.strip_suffix(".crt").map(str::to_string))
            .filter(|host| self.is_secured(host))
            .collect())
    }

    /// Whether the host holds a complete certificate set.
    pub fn is_secured(&self, host: &str) -> bool {
        self.leaf_paths(host)
            .all()
            .iter()
            .all(|path| self.fs.exists(path))
    }

    /// Untrust and delete the root so the next `ensure_root` regenerates it.
    pub fn remove_root(&self) -> ValetResult<()> {
        if let Err(e) = self.trust.uninstall(CA_FILE_STEM) {
            warn!(error = %e, "Failed to remove root CA from trust stores");
        }
        for path in self.root_paths().all() {
            self.fs.remove(path)?;
        }
        info!(ca_dir = %self.ca_dir.display(), "Root CA removed");
        Ok(())
    }

    fn trust_root(&self, root: &RootPaths) {
        if let Err(e) = self.trust.install(&root.pem, CA_FILE_STEM) {
            warn!(error = %e, "Root CA could not be added to every trust store");
        }
    }

    fn openssl(&self) -> SubprocessBuilder {
        SubprocessBuilder::new("openssl").timeout(self.timeout)
    }

    fn openssl_step(
        &self,
        command: SubprocessBuilder,
        subject: &str,
        step: &'static str,
    ) -> ValetResult<()> {
        debug!(subject, step, command = %command, "Running openssl");
        let result = self.runner.run(command)?;
        if result.success {
            return Ok(());
        }
        warn!(subject, step, exit_code = ?result.exit_code, "openssl failed");
        Err(ValetError::CertificateSigningFailed {
            subject: subject.to_string(),
            step,
            exit_code: result.exit_code,
            output: result.diagnostic(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::SubprocessResult;
    use std::sync::Mutex;

    /// Writes every `-out`/`-keyout` file and records the invocations.
    #[derive(Default)]
    struct FakeOpenssl {
        calls: Mutex<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
    }

    impl CommandRunner for FakeOpenssl {
        fn run(&self, command: SubprocessBuilder) -> ValetResult<SubprocessResult> {
            let args = command.arguments().to_vec();
            self.calls.lock().unwrap().push(args.clone());
            if self.fail_on == Some(args[0].as_str()) {
                return Ok(SubprocessResult::failed(1, "unable to load key"));
            }
            for flag in ["-out", "-keyout"] {
                if let Some(path) = command.flag_value(flag) {
                    std::fs::write(path, "PEM").unwrap();
                }
            }
            if let Some(srl) = command.flag_value("-CAserial") {
                std::fs::write(srl, "01").unwrap();
            }
            Ok(SubprocessResult::ok())
        }
    }

    struct NoTrust;

    impl TrustStore for NoTrust {
        fn install(&self, _pem: &Path, _name: &str) -> ValetResult<()> {
            Err(ValetError::execution_failed("no trust store"))
        }

        fn uninstall(&self, _name: &str) -> ValetResult<()> {
            Ok(())
        }
    }

    fn authority(home: &Path, runner: Arc<FakeOpenssl>) -> CertificateAuthority {
        CertificateAuthority::new(
            home,
            runner,
            Arc::new(Filesystem::new(None)),
            TemplateEngine::builtin().unwrap(),
            Arc::new(NoTrust),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_root_created_once_despite_trust_failure() {
        let home = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeOpenssl::default());
        let ca = authority(home.path(), runner.clone());

        assert_eq!(ca.ensure_root(730).unwrap(), RootStatus::Created);
        assert_eq!(ca.ensure_root(730).unwrap(), RootStatus::Existing);
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_issue_list_revoke() {
        let home = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeOpenssl::default());
        let ca = authority(home.path(), runner.clone());
        ca.ensure_root(730).unwrap();

        ca.issue_leaf("blog.test", 368).unwrap();
        assert!(ca.is_secured("blog.test"));
        assert!(ca.list_secured().unwrap().contains("blog.test"));

        let conf = std::fs::read_to_string(ca.leaf_paths("blog.test").conf).unwrap();
        assert!(conf.contains("DNS.2 = *.blog.test"));

        assert!(ca.revoke_leaf("blog.test").unwrap());
        assert!(!ca.revoke_leaf("blog.test").unwrap());
        assert!(ca.list_secured().unwrap().is_empty());
    }

    #[test]
    fn test_partial_leaf_is_not_secured() {
        let home = tempfile::tempdir().unwrap();
        let ca = authority(home.path(), Arc::new(FakeOpenssl::default()));
        let crt = ca.leaf_paths("half.test").crt;
        std::fs::create_dir_all(crt.parent().unwrap()).unwrap();
        std::fs::write(&crt, "leftover").unwrap();

        assert!(!ca.is_secured("half.test"));
        assert!(ca.list_secured().unwrap().is_empty());
    }

    #[test]
    fn test_serial_created_once() {
        let home = tempfile::tempdir().unwrap();
        let runner = Arc::new(FakeOpenssl::default());
        let ca = authority(home.path(), runner.clone());
        ca.ensure_root(730).unwrap();

        ca.issue_leaf("a.test", 368).unwrap();
        ca.issue_leaf("b.test", 368).unwrap();

        let calls = runner.calls.lock().unwrap();
        let signings: Vec<_> = calls.iter().filter(|c| c[0] == "x509").collect();
        assert_eq!(signings.len(), 2);
        assert!(signings[0].iter().any(|a| a == "-CAcreateserial"));
        assert!(!signings[1].iter().any(|a| a == "-CAcreateserial"));
    }

    #[test]
    fn test_failed_signing_leaves_nothing() {
        let home = tempfile::tempdir().unwrap();
        let ok = Arc::new(FakeOpenssl::default());
        authority(home.path(), ok).ensure_root(730).unwrap();

        let failing = Arc::new(FakeOpenssl {
            fail_on: Some("x509"),
            ..FakeOpenssl::default()
        });
        let ca = authority(home.path(), failing);

        match ca.issue_leaf("blog.test", 368) {
            Err(ValetError::CertificateSigningFailed {
                step, exit_code, ..
            }) => {
                assert_eq!(step, "signing");
                assert_eq!(exit_code, Some(1));
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        for path in ca.leaf_paths("blog.test").all() {
            assert!(!path.exists(), "{} left behind", path.display());
        }
    }

    #[test]
    fn test_issue_without_root_fails() {
        let home = tempfile::tempdir().unwrap();
        let ca = authority(home.path(), Arc::new(FakeOpenssl::default()));
        assert!(matches!(
            ca.issue_leaf("blog.test", 368),
            Err(ValetError::CertificateSigningFailed { step: "root lookup", .. })
        ));
    }

    #[test]
    fn test_remove_root_allows_regeneration() {
        let home = tempfile::tempdir().unwrap();
        let ca = authority(home.path(), Arc::new(FakeOpenssl::default()));
        ca.ensure_root(730).unwrap();
        ca.remove_root().unwrap();
        assert!(!ca.root_paths().pem.exists());
        assert_eq!(ca.ensure_root(730).unwrap(), RootStatus::Created);
    }
}
