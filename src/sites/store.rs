//! Generated Nginx site files.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::certs::CertificateAuthority;
use crate::config::{GlobalParameters, ValetConfig};
use crate::error::{ValetError, ValetResult};
use crate::filesystem::Filesystem;
use crate::php::socket_path;
use crate::templates::TemplateEngine;

use super::marker;
use super::mode::{SiteMode, SiteRecord};

/// URL prefix Nginx uses to serve static files straight from disk.
const STATIC_PREFIX: &str = "41c270e4-5535-4daa-b23e-c269744c2f45";

/// A site file that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSite {
    pub hostname: String,
    pub reason: String,
}

/// Outcome of a full regeneration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegenerationReport {
    pub rewritten: Vec<String>,
    pub skipped: Vec<SkippedSite>,
}

/// Every decodable site file, plus the ones that were not.
#[derive(Debug, Clone, Default)]
pub struct SiteScan {
    pub records: Vec<SiteRecord>,
    pub skipped: Vec<SkippedSite>,
}

/// A directory linked into `<home>/Sites`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedSite {
    pub name: String,
    pub path: PathBuf,
}

/// Reads and writes per-site Nginx files in `<home>/Nginx`.
///
/// A site with neither a proxy, an isolation nor a certificate needs no file:
/// the catch-all server block serves it.
pub struct SiteConfigStore {
    home: PathBuf,
    nginx_dir: PathBuf,
    links_dir: PathBuf,
    catch_all: PathBuf,
    server_script: PathBuf,
    fs: Arc<Filesystem>,
    templates: TemplateEngine,
    ca: Arc<CertificateAuthority>,
}

impl SiteConfigStore {
    pub fn new(
        home: &Path,
        catch_all: PathBuf,
        server_script: PathBuf,
        fs: Arc<Filesystem>,
        templates: TemplateEngine,
        ca: Arc<CertificateAuthority>,
    ) -> Self {
        Self {
            home: home.to_path_buf(),
            nginx_dir: home.join("Nginx"),
            links_dir: home.join("Sites"),
            catch_all,
            server_script,
            fs,
            templates,
            ca,
        }
    }

    pub fn site_path(&self, host: &str) -> PathBuf {
        self.nginx_dir.join(host)
    }

    pub fn catch_all_path(&self) -> &Path {
        &self.catch_all
    }

    /// Reconstruct a site from its file. `None` when there is no file.
    pub fn derive(&self, host: &str) -> ValetResult<Option<SiteRecord>> {
        let path = self.site_path(host);
        let Some(content) = self.fs.read_optional(&path)? else {
            return Ok(None);
        };

        let (mode, secured) =
            marker::decode(&content).map_err(|reason| ValetError::MalformedSiteConfig {
                path: path.clone(),
                reason,
            })?;

        Ok(Some(SiteRecord {
            hostname: host.to_string(),
            mode,
            secured,
            config_path: path,
        }))
    }

    /// Render the full contents of a site file, marker header included.
    pub fn render(
        &self,
        host: &str,
        mode: &SiteMode,
        secured: bool,
        params: &GlobalParameters,
    ) -> ValetResult<String> {
        let template = format!("{}.tera", marker::stub_name(mode, secured));
        let body = self
            .templates
            .render(&template, &self.context(host, mode, params))?;
        Ok(format!("{}{}", marker::encode(mode, secured), body))
    }

    /// Replace the site file for `host`.
    pub fn write(
        &self,
        host: &str,
        mode: &SiteMode,
        secured: bool,
        params: &GlobalParameters,
    ) -> ValetResult<PathBuf> {
        let content = self.render(host, mode, secured, params)?;
        let path = self.site_path(host);
        self.fs.ensure_dir_as_user(&self.nginx_dir)?;
        self.fs.write_as_user(&path, &content)?;
        debug!(host, mode = %mode, secured, path = %path.display(), "Site file written");
        Ok(path)
    }

    /// Delete the site file. Returns whether there was one.
    pub fn remove(&self, host: &str) -> ValetResult<bool> {
        let removed = self.fs.remove(&self.site_path(host))?;
        if removed {
            debug!(host, "Site file removed");
        }
        Ok(removed)
    }

    /// Hostnames that have a site file.
    pub fn hostnames(&self) -> ValetResult<Vec<String>> {
        Ok(self
            .fs
            .scandir(&self.nginx_dir)?
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .filter(|name| !self.fs.is_dir(&self.nginx_dir.join(name)))
            .collect())
    }

    /// Decode every site file.
    pub fn scan(&self) -> ValetResult<SiteScan> {
        let mut scan = SiteScan::default();
        for host in self.hostnames()? {
            match self.derive(&host) {
                Ok(Some(record)) => scan.records.push(record),
                Ok(None) => {}
                Err(ValetError::MalformedSiteConfig { path, reason }) => {
                    warn!(path = %path.display(), %reason, "Skipping malformed site file");
                    scan.skipped.push(SkippedSite {
                        hostname: host,
                        reason,
                    });
                }
                Err(e) => return Err(e),
            }
        }
        Ok(scan)
    }

    /// `(hostname, php_version)` of every isolated site.
    pub fn isolated_sites(&self) -> ValetResult<Vec<(String, String)>> {
        Ok(self
            .scan()?
            .records
            .into_iter()
            .filter_map(|record| match record.mode {
                SiteMode::Isolated { php_version } => Some((record.hostname, php_version)),
                _ => None,
            })
            .collect())
    }

    /// Every proxied site.
    pub fn proxies(&self) -> ValetResult<Vec<SiteRecord>> {
        Ok(self
            .scan()?
            .records
            .into_iter()
            .filter(|record| matches!(record.mode, SiteMode::Proxy { .. }))
            .collect())
    }

    /// Rewrite every site file and the catch-all from the current parameters.
    ///
    /// Hosts holding a certificate under the current domain get a file even if
    /// they had none; the secured flag always follows the certificate
    /// directory. Malformed files are left untouched and reported.
    pub fn regenerate_all(&self, params: &GlobalParameters) -> ValetResult<RegenerationReport> {
        let suffix = format!(".{}", params.domain);

        let mut hosts: BTreeSet<String> = self.hostnames()?.into_iter().collect();
        hosts.extend(
            self.ca
                .list_secured()?
                .into_iter()
                .filter(|h| h.ends_with(&suffix)),
        );

        let mut report = RegenerationReport::default();
        for host in hosts {
            let mode = match self.derive(&host) {
                Ok(Some(record)) => record.mode,
                Ok(None) => SiteMode::Plain,
                Err(ValetError::MalformedSiteConfig { path, reason }) => {
                    warn!(path = %path.display(), %reason, "Not regenerating malformed site file");
                    report.skipped.push(SkippedSite {
                        hostname: host,
                        reason,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            // A leftover partial certificate set does not make a host secured.
            let secured = self.ca.is_secured(&host);
            self.write(&host, &mode, secured, params)?;
            report.rewritten.push(host);
        }

        self.write_catch_all(params)?;

        info!(
            rewritten = report.rewritten.len(),
            skipped = report.skipped.len(),
            "Site files regenerated"
        );
        Ok(report)
    }

    /// Write the server block that serves every site without its own file.
    pub fn write_catch_all(&self, params: &GlobalParameters) -> ValetResult<()> {
        let content = self
            .templates
            .render("valet.conf.tera", &self.context("", &SiteMode::Plain, params))?;
        self.fs.write(&self.catch_all, &content)?;
        debug!(path = %self.catch_all.display(), "Catch-all server block written");
        Ok(())
    }

    /// Move every site file of the old domain to its new hostname.
    ///
    /// Returns `(old, new)` pairs. Malformed files stay where they are.
    pub fn rename_domain(
        &self,
        old: &GlobalParameters,
        new: &GlobalParameters,
    ) -> ValetResult<Vec<(String, String)>> {
        let suffix = format!(".{}", old.domain);
        let mut renamed = Vec::new();

        for host in self.hostnames()? {
            if !host.ends_with(&suffix) {
                continue;
            }
            let record = match self.derive(&host) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(ValetError::MalformedSiteConfig { path, reason }) => {
                    warn!(path = %path.display(), %reason, "Leaving malformed site file in place");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let new_host = new.hostname(old.site_name(&host));
            self.write(&new_host, &record.mode, record.secured, new)?;
            self.remove(&host)?;
            info!(from = %host, to = %new_host, "Site renamed");
            renamed.push((host, new_host));
        }
        Ok(renamed)
    }

    /// Link `target` into the Sites directory under `name`.
    pub fn link(&self, name: &str, target: &Path) -> ValetResult<PathBuf> {
        if !self.fs.is_dir(target) {
            return Err(ValetError::invalid_parameter(
                "path",
                format!("'{}' is not a directory", target.display()),
            ));
        }
        let link = self.links_dir.join(name);
        self.fs.ensure_dir_as_user(&self.links_dir)?;
        self.fs.symlink_as_user(target, &link)?;
        info!(name, target = %target.display(), "Site linked");
        Ok(link)
    }

    /// Remove the link named `name`. Returns whether it existed.
    pub fn unlink(&self, name: &str) -> ValetResult<bool> {
        let link = self.links_dir.join(name);
        if !self.fs.is_link(&link) {
            return Ok(false);
        }
        self.fs.remove(&link)
    }

    /// Every linked site.
    pub fn links(&self) -> ValetResult<Vec<LinkedSite>> {
        Ok(self
            .fs
            .scandir(&self.links_dir)?
            .into_iter()
            .filter_map(|name| {
                let path = self.fs.read_link(&self.links_dir.join(&name))?;
                Some(LinkedSite { name, path })
            })
            .collect())
    }

    /// Whether `name` is linked, lives in a parked directory, or already has
    /// a site file.
    pub fn site_exists(&self, name: &str, config: &ValetConfig) -> bool {
        if self.fs.is_link(&self.links_dir.join(name)) {
            return true;
        }
        if config
            .paths
            .iter()
            .any(|parked| self.fs.is_dir(&parked.join(name)))
        {
            return true;
        }
        self.fs
            .exists(&self.site_path(&config.parameters().hostname(name)))
    }

    fn context(&self, host: &str, mode: &SiteMode, params: &GlobalParameters) -> serde_json::Value {
        let php_version = mode.isolated_version().unwrap_or(&params.php_version);
        let leaf = self.ca.leaf_paths(host);
        let https_suffix = if params.https_port == 443 {
            String::new()
        } else {
            format!(":{}", params.https_port)
        };
        let proxy_host = match mode {
            SiteMode::Proxy { upstream } => upstream.as_str(),
            _ => "",
        };

        json!({
            "site": host,
            "http_port": params.port,
            "https_port": params.https_port,
            "https_suffix": https_suffix,
            "static_prefix": STATIC_PREFIX,
            "server_script": self.server_script.display().to_string(),
            "valet_home": self.home.display().to_string(),
            "fpm_socket": socket_path(&self.home, php_version).display().to_string(),
            "php_version": php_version,
            "cert": leaf.crt.display().to_string(),
            "key": leaf.key.display().to_string(),
            "proxy_host": proxy_host,
        })
    }
}
