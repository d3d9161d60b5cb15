//! Site routing modes.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// How a site is served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SiteMode {
    /// Served by the default PHP version.
    Plain,
    /// Reverse-proxied to an upstream URL.
    Proxy { upstream: String },
    /// Pinned to its own PHP-FPM pool.
    Isolated { php_version: String },
}

impl SiteMode {
    /// Stub type name used in markers and template names.
    pub fn stub_type(&self) -> &'static str {
        match self {
            SiteMode::Plain => "plain",
            SiteMode::Proxy { .. } => "proxy",
            SiteMode::Isolated { .. } => "isolated",
        }
    }

    pub fn isolated_version(&self) -> Option<&str> {
        match self {
            SiteMode::Isolated { php_version } => Some(php_version),
            _ => None,
        }
    }
}

impl fmt::Display for SiteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteMode::Plain => write!(f, "plain"),
            SiteMode::Proxy { upstream } => write!(f, "proxy to {}", upstream),
            SiteMode::Isolated { php_version } => write!(f, "isolated on PHP {}", php_version),
        }
    }
}

/// A site as reconstructed from its generated Nginx file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteRecord {
    pub hostname: String,
    pub mode: SiteMode,
    pub secured: bool,
    pub config_path: PathBuf,
}
