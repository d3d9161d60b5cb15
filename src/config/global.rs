//! Global parameters persisted in `config.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValetResult;
use crate::filesystem::Filesystem;

/// Default pseudo-TLD.
pub const DEFAULT_DOMAIN: &str = "test";

/// Default PHP version when `config.json` does not name one.
pub const DEFAULT_PHP_VERSION: &str = "8.2";

/// Persisted fleet-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValetConfig {
    /// Pseudo-TLD every site lives under.
    #[serde(default = "default_domain", alias = "tld")]
    pub domain: String,
    /// Plain HTTP port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// HTTPS port for secured sites.
    #[serde(default = "default_https_port")]
    pub https_port: u16,
    /// Process-wide default PHP version.
    #[serde(default = "default_php_version")]
    pub php_version: String,
    /// Parked directories; each child directory is a site.
    #[serde(default)]
    pub paths: Vec<PathBuf>,
}

/// Immutable snapshot of the parameters every generated artifact depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalParameters {
    pub domain: String,
    pub port: u16,
    pub https_port: u16,
    pub php_version: String,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

fn default_port() -> u16 {
    80
}

fn default_https_port() -> u16 {
    443
}

fn default_php_version() -> String {
    DEFAULT_PHP_VERSION.to_string()
}

impl Default for ValetConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            port: default_port(),
            https_port: default_https_port(),
            php_version: default_php_version(),
            paths: Vec::new(),
        }
    }
}

impl ValetConfig {
    /// Take a parameter snapshot.
    pub fn parameters(&self) -> GlobalParameters {
        GlobalParameters {
            domain: self.domain.clone(),
            port: self.port,
            https_port: self.https_port,
            php_version: self.php_version.clone(),
        }
    }
}

impl GlobalParameters {
    /// Fully-qualified hostname of a site name under the pseudo-TLD.
    ///
    /// Names that already carry the suffix are returned unchanged.
    pub fn hostname(&self, site: &str) -> String {
        let suffix = format!(".{}", self.domain);
        if site.ends_with(&suffix) {
            site.to_string()
        } else {
            format!("{}{}", site, suffix)
        }
    }

    /// Strip the pseudo-TLD from a hostname, if present.
    pub fn site_name<'a>(&self, hostname: &'a str) -> &'a str {
        hostname
            .strip_suffix(&format!(".{}", self.domain))
            .unwrap_or(hostname)
    }
}

/// Reads and writes `config.json`.
///
/// Nothing is cached: every call goes to disk so that changes made by another
/// invocation are picked up.
pub struct ConfigStore {
    path: PathBuf,
    fs: Arc<Filesystem>,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<Filesystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the configuration; a missing file yields the defaults.
    pub fn read(&self) -> ValetResult<ValetConfig> {
        if !self.fs.exists(&self.path) {
            return Ok(ValetConfig::default());
        }
        let content = self.fs.read(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Persist the configuration, owned by the developer user.
    pub fn write(&self, config: &ValetConfig) -> ValetResult<()> {
        let content = serde_json::to_string_pretty(config)?;
        self.fs.write_as_user(&self.path, &format!("{}\n", content))?;
        debug!(path = %self.path.display(), "Configuration written");
        Ok(())
    }

    /// Read, modify and persist in one step.
    pub fn update<F>(&self, mutate: F) -> ValetResult<ValetConfig>
    where
        F: FnOnce(&mut ValetConfig),
    {
        let mut config = self.read()?;
        mutate(&mut config);
        self.write(&config)?;
        Ok(config)
    }

    /// Current parameter snapshot.
    pub fn parameters(&self) -> ValetResult<GlobalParameters> {
        Ok(self.read()?.parameters())
    }
}
