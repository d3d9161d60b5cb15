//! Fleet-wide reconciliation after a global or per-site change.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::certs::CertificateAuthority;
use crate::config::{CertificatesConfig, ConfigStore, GlobalParameters};
use crate::error::{ValetError, ValetResult};
use crate::php::{normalize, VersionRegistry};
use crate::services::NginxService;
use crate::sites::{LinkedSite, RegenerationReport, SiteConfigStore, SiteMode};
use crate::validation::{validate_site_name, validate_tld, validate_upstream};

/// Result of a pseudo-TLD change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainChange {
    pub previous: String,
    pub current: String,
    /// Hosts whose certificate was reissued under the new domain.
    pub reissued: Vec<String>,
    /// `(old, new)` hostnames of moved site files.
    pub renamed: Vec<(String, String)>,
    pub report: RegenerationReport,
}

/// Result of an isolate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Isolation {
    pub hostname: String,
    pub php_version: String,
    pub secured: bool,
    /// Previously pinned version whose FPM was stopped.
    pub stopped: Option<String>,
}

/// Result of an unisolate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unisolation {
    pub hostname: String,
    /// `None` when the site was not isolated.
    pub previous_version: Option<String>,
    pub stopped: bool,
}

/// Result of a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxySite {
    pub hostname: String,
    pub upstream: String,
    pub secured: bool,
}

/// Applies changes and brings every derived artifact back in line.
///
/// Each operation validates its input first, then mutates, then restarts
/// what needs restarting. Nothing is cached between steps.
pub struct Reconciler {
    config: Arc<ConfigStore>,
    sites: Arc<SiteConfigStore>,
    ca: Arc<CertificateAuthority>,
    php: Arc<VersionRegistry>,
    nginx: Arc<NginxService>,
    certificates: CertificatesConfig,
}

impl Reconciler {
    pub fn new(
        config: Arc<ConfigStore>,
        sites: Arc<SiteConfigStore>,
        ca: Arc<CertificateAuthority>,
        php: Arc<VersionRegistry>,
        nginx: Arc<NginxService>,
        certificates: CertificatesConfig,
    ) -> Self {
        Self {
            config,
            sites,
            ca,
            php,
            nginx,
            certificates,
        }
    }

    /// Fully-qualified hostname for a site name or hostname argument.
    pub fn hostname(&self, site: &str) -> ValetResult<String> {
        let params = self.config.parameters()?;
        Ok(params.hostname(validate_site_name(site)?))
    }

    /// Move the whole fleet to a new pseudo-TLD.
    pub fn on_domain_change(&self, domain: &str) -> ValetResult<DomainChange> {
        let domain = validate_tld(domain)?;
        let old = self.config.parameters()?;

        if old.domain == domain {
            info!(domain = %domain, "Domain unchanged");
            return Ok(DomainChange {
                previous: old.domain.clone(),
                current: domain,
                reissued: Vec::new(),
                renamed: Vec::new(),
                report: RegenerationReport::default(),
            });
        }

        let new = GlobalParameters {
            domain: domain.clone(),
            ..old.clone()
        };

        let suffix = format!(".{}", old.domain);
        let secured: Vec<String> = self
            .ca
            .list_secured()?
            .into_iter()
            .filter(|host| host.ends_with(&suffix))
            .collect();

        let mut reissued = Vec::new();
        if !secured.is_empty() {
            self.ca.ensure_root(self.certificates.ca_validity_days)?;
        }
        for host in secured {
            let new_host = new.hostname(old.site_name(&host));
            self.ca.revoke_leaf(&host)?;
            self.ca
                .issue_leaf(&new_host, self.certificates.leaf_validity_days)?;
            reissued.push(new_host);
        }

        let renamed = self.sites.rename_domain(&old, &new)?;
        self.config.update(|c| c.domain = domain.clone())?;
        let report = self.sites.regenerate_all(&new)?;
        self.nginx.restart()?;

        info!(from = %old.domain, to = %domain, "Domain changed");
        Ok(DomainChange {
            previous: old.domain,
            current: domain,
            reissued,
            renamed,
            report,
        })
    }

    /// Change the HTTP port, or the HTTPS port when `https` is set.
    pub fn on_port_change(&self, port: u16, https: bool) -> ValetResult<RegenerationReport> {
        if port == 0 {
            return Err(ValetError::invalid_parameter("port", "Port must be between 1 and 65535"));
        }

        let config = self.config.update(|c| {
            if https {
                c.https_port = port;
            } else {
                c.port = port;
            }
        })?;

        let report = self.sites.regenerate_all(&config.parameters())?;
        self.nginx.restart()?;
        info!(port, https, "Port changed");
        Ok(report)
    }

    /// Pin a site to its own PHP version.
    pub fn on_isolate(&self, site: &str, version: &str, secure: bool) -> ValetResult<Isolation> {
        let version = self
            .php
            .supported()
            .validate_isolation(&normalize(version)?)?;

        let config = self.config.read()?;
        let params = config.parameters();
        let name = params.site_name(validate_site_name(site)?).to_string();
        if !self.sites.site_exists(&name, &config) {
            return Err(ValetError::SiteNotFound { site: name });
        }
        let host = params.hostname(&name);

        let previous = self
            .sites
            .derive(&host)?
            .and_then(|record| record.mode.isolated_version().map(str::to_string));

        self.php.install(&version)?;

        let mut secured = self.ca.is_secured(&host);
        if secure && !secured {
            self.ca.ensure_root(self.certificates.ca_validity_days)?;
            self.ca
                .issue_leaf(&host, self.certificates.leaf_validity_days)?;
            secured = true;
        }

        let mode = SiteMode::Isolated {
            php_version: version.clone(),
        };
        self.sites.write(&host, &mode, secured, &params)?;
        self.php.restart(&version)?;
        self.nginx.restart()?;
        info!(host = %host, version = %version, secured, "Site isolated");

        let mut stopped = None;
        if let Some(old) = previous {
            if normalize(&old).map(|o| o != version).unwrap_or(true)
                && self.php.stop_if_unused(&old)?
            {
                stopped = Some(old);
            }
        }

        Ok(Isolation {
            hostname: host,
            php_version: version,
            secured,
            stopped,
        })
    }

    /// Return a site to the default PHP version, keeping its certificate.
    pub fn on_unisolate(&self, site: &str) -> ValetResult<Unisolation> {
        let host = self.hostname(site)?;
        let params = self.config.parameters()?;

        let previous = self
            .sites
            .derive(&host)?
            .and_then(|record| record.mode.isolated_version().map(str::to_string));
        let Some(old) = previous else {
            info!(host = %host, "Site is not isolated");
            return Ok(Unisolation {
                hostname: host,
                previous_version: None,
                stopped: false,
            });
        };

        if self.ca.is_secured(&host) {
            self.sites.write(&host, &SiteMode::Plain, true, &params)?;
        } else {
            // The catch-all serves plain, unsecured sites.
            self.sites.remove(&host)?;
        }
        self.nginx.restart()?;
        info!(host = %host, version = %old, "Site unisolated");

        let stopped = self.php.stop_if_unused(&old)?;
        Ok(Unisolation {
            hostname: host,
            previous_version: Some(old),
            stopped,
        })
    }

    /// Issue a certificate for a site and serve it over HTTPS.
    pub fn secure(&self, site: &str) -> ValetResult<String> {
        let host = self.hostname(site)?;
        let params = self.config.parameters()?;
        let mode = self
            .sites
            .derive(&host)?
            .map(|record| record.mode)
            .unwrap_or(SiteMode::Plain);

        self.ca.ensure_root(self.certificates.ca_validity_days)?;
        self.ca
            .issue_leaf(&host, self.certificates.leaf_validity_days)?;
        self.sites.write(&host, &mode, true, &params)?;
        self.nginx.restart()?;

        info!(host = %host, "Site secured");
        Ok(host)
    }

    /// Drop a site's certificate and serve it over plain HTTP.
    ///
    /// Returns whether a certificate was removed.
    pub fn unsecure(&self, site: &str) -> ValetResult<bool> {
        let host = self.hostname(site)?;
        let params = self.config.parameters()?;

        let current = self.sites.derive(&host)?;
        let revoked = self.ca.revoke_leaf(&host)?;
        match current {
            Some(record) if record.mode != SiteMode::Plain => {
                self.sites.write(&host, &record.mode, false, &params)?;
            }
            Some(_) => {
                self.sites.remove(&host)?;
            }
            None => {}
        }
        self.nginx.restart()?;

        if revoked {
            info!(host = %host, "Site unsecured");
        }
        Ok(revoked)
    }

    /// Serve a site by proxying to `url`.
    pub fn proxy(&self, site: &str, url: &str, secure: bool) -> ValetResult<ProxySite> {
        let upstream = validate_upstream(url)?;
        let host = self.hostname(site)?;
        let params = self.config.parameters()?;

        let mut secured = self.ca.is_secured(&host);
        if secure && !secured {
            self.ca.ensure_root(self.certificates.ca_validity_days)?;
            self.ca
                .issue_leaf(&host, self.certificates.leaf_validity_days)?;
            secured = true;
        }

        let mode = SiteMode::Proxy {
            upstream: upstream.clone(),
        };
        self.sites.write(&host, &mode, secured, &params)?;
        self.nginx.restart()?;

        info!(host = %host, upstream = %upstream, secured, "Site proxied");
        Ok(ProxySite {
            hostname: host,
            upstream,
            secured,
        })
    }

    /// Remove a proxy together with its certificate.
    pub fn unproxy(&self, site: &str) -> ValetResult<bool> {
        let host = self.hostname(site)?;
        match self.sites.derive(&host)? {
            Some(record) if matches!(record.mode, SiteMode::Proxy { .. }) => {}
            _ => {
                warn!(host = %host, "Site is not proxied");
                return Ok(false);
            }
        }

        self.sites.remove(&host)?;
        self.ca.revoke_leaf(&host)?;
        self.nginx.restart()?;
        info!(host = %host, "Proxy removed");
        Ok(true)
    }

    /// Link a directory as a site, optionally securing it.
    pub fn link(&self, name: &str, target: &Path, secure: bool) -> ValetResult<(LinkedSite, String)> {
        let name = validate_site_name(name)?;
        let path = self.sites.link(name, target)?;
        let host = if secure {
            self.secure(name)?
        } else {
            self.hostname(name)?
        };
        Ok((
            LinkedSite {
                name: name.to_string(),
                path,
            },
            host,
        ))
    }

    /// Remove a link and any certificate of the site.
    pub fn unlink(&self, name: &str) -> ValetResult<bool> {
        let name = validate_site_name(name)?;
        let removed = self.sites.unlink(name)?;
        let host = self.hostname(name)?;
        if self.ca.is_secured(&host) {
            self.unsecure(name)?;
        }
        Ok(removed)
    }

    /// Rewrite everything from the current parameters.
    pub fn regenerate(&self) -> ValetResult<RegenerationReport> {
        let params = self.config.parameters()?;
        let report = self.sites.regenerate_all(&params)?;
        self.nginx.restart()?;
        Ok(report)
    }
}
