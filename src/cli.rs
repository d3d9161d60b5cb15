//! Command line surface.
//!
//! Each subcommand maps to one registered [`Command`](crate::commands::Command);
//! [`Verb::into_request`] turns the parsed arguments into the JSON parameters
//! the command validates.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::commands::CommandParams;

pub const DEFAULT_SETTINGS_PATH: &str = "/etc/valet/valet.toml";

#[derive(Parser, Debug)]
#[command(
    name = "valet",
    version,
    about = "Local PHP development environment: site routing, PHP-FPM versions, local TLS"
)]
pub struct Cli {
    /// Engine settings file
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SETTINGS_PATH, global = true)]
    pub config: PathBuf,

    /// Output JSON instead of human-readable text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Verb>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    /// Change the default PHP version
    Use {
        /// Version such as "8.3", "php@8.3" or "83"
        version: String,
        /// Also point the `php` CLI symlink at the new version
        #[arg(long)]
        update_cli: bool,
        /// Fail instead of installing a missing FPM package
        #[arg(long)]
        no_install: bool,
    },
    /// Pin a site to a PHP version
    Isolate {
        version: String,
        /// Site name (default: current directory)
        #[arg(long)]
        site: Option<String>,
        /// Issue a certificate as well
        #[arg(long)]
        secure: bool,
    },
    /// Return a site to the default PHP version
    Unisolate {
        #[arg(long)]
        site: Option<String>,
    },
    /// List isolated sites
    Isolated,
    /// Show or change the domain
    Domain { name: Option<String> },
    /// Show or change the HTTP(S) port
    Port {
        #[arg(value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,
        /// Act on the HTTPS port
        #[arg(long)]
        https: bool,
    },
    /// Serve a site over HTTPS
    Secure { site: Option<String> },
    /// Serve a site over plain HTTP
    Unsecure { site: Option<String> },
    /// List secured sites, or check one
    Secured { site: Option<String> },
    /// Serve a directory as a site
    Link {
        name: Option<String>,
        /// Directory to serve (default: current directory)
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        secure: bool,
    },
    /// Remove a linked site
    Unlink { name: Option<String> },
    /// List linked sites
    Links,
    /// Proxy a site to another server
    Proxy {
        site: String,
        /// Upstream such as "localhost:8000" or "https://backend"
        url: String,
        #[arg(long)]
        secure: bool,
    },
    /// Remove a proxy
    Unproxy { site: String },
    /// List proxied sites
    Proxies,
    /// Rewrite every site file
    Regenerate,
}

impl Verb {
    /// Registry name of the command this verb runs.
    pub fn name(&self) -> &'static str {
        match self {
            Verb::Use { .. } => "use",
            Verb::Isolate { .. } => "isolate",
            Verb::Unisolate { .. } => "unisolate",
            Verb::Isolated => "isolated",
            Verb::Domain { .. } => "domain",
            Verb::Port { .. } => "port",
            Verb::Secure { .. } => "secure",
            Verb::Unsecure { .. } => "unsecure",
            Verb::Secured { .. } => "secured",
            Verb::Link { .. } => "link",
            Verb::Unlink { .. } => "unlink",
            Verb::Links => "links",
            Verb::Proxy { .. } => "proxy",
            Verb::Unproxy { .. } => "unproxy",
            Verb::Proxies => "proxies",
            Verb::Regenerate => "regenerate",
        }
    }

    /// Command name and parameters for the registry.
    pub fn into_request(self) -> (&'static str, CommandParams) {
        let name = self.name();
        let mut params = Map::new();

        match self {
            Verb::Use {
                version,
                update_cli,
                no_install,
            } => {
                params.insert("version".into(), Value::String(version));
                params.insert("update_cli".into(), Value::Bool(update_cli));
                params.insert("no_install".into(), Value::Bool(no_install));
            }
            Verb::Isolate {
                version,
                site,
                secure,
            } => {
                params.insert("version".into(), Value::String(version));
                insert_opt(&mut params, "site", site);
                params.insert("secure".into(), Value::Bool(secure));
            }
            Verb::Unisolate { site } => insert_opt(&mut params, "site", site),
            Verb::Domain { name } => insert_opt(&mut params, "name", name),
            Verb::Port { port, https } => {
                if let Some(port) = port {
                    params.insert("port".into(), Value::from(port));
                }
                params.insert("https".into(), Value::Bool(https));
            }
            Verb::Secure { site } | Verb::Unsecure { site } | Verb::Secured { site } => {
                insert_opt(&mut params, "site", site)
            }
            Verb::Link { name, path, secure } => {
                insert_opt(&mut params, "name", name);
                insert_opt(
                    &mut params,
                    "path",
                    path.map(|p| p.to_string_lossy().into_owned()),
                );
                params.insert("secure".into(), Value::Bool(secure));
            }
            Verb::Unlink { name } => insert_opt(&mut params, "name", name),
            Verb::Proxy { site, url, secure } => {
                params.insert("site".into(), Value::String(site));
                params.insert("url".into(), Value::String(url));
                params.insert("secure".into(), Value::Bool(secure));
            }
            Verb::Unproxy { site } => {
                params.insert("site".into(), Value::String(site));
            }
            Verb::Isolated | Verb::Links | Verb::Proxies | Verb::Regenerate => {}
        }

        (name, CommandParams::new(Value::Object(params)))
    }
}

fn insert_opt(params: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        params.insert(key.to_string(), Value::String(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("valet").chain(argv.iter().copied()))
    }

    #[test]
    fn test_use_flags() {
        let cli = parse(&["use", "php@7.4", "--update-cli"]).unwrap();
        let (name, params) = cli.command.unwrap().into_request();

        assert_eq!(name, "use");
        assert_eq!(params.get_string("version").unwrap(), "php@7.4");
        assert!(params.get_optional_bool("update_cli", false));
        assert!(!params.get_optional_bool("no_install", true));
    }

    #[test]
    fn test_isolate_site_flag() {
        let cli = parse(&["isolate", "8.1", "--site", "blog", "--secure"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Verb::Isolate {
                version: "8.1".to_string(),
                site: Some("blog".to_string()),
                secure: true,
            })
        );

        let cli = parse(&["isolate", "8.1", "--site=shop"]).unwrap();
        let (_, params) = cli.command.unwrap().into_request();
        assert_eq!(params.get_string("site").unwrap(), "shop");
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(parse(&["isolate", "8.1", "--secrue"]).is_err());
        assert!(parse(&["use", "8.3", "8.4"]).is_err());
        assert!(parse(&["park"]).is_err());
    }

    #[test]
    fn test_port_range() {
        assert!(parse(&["port", "0"]).is_err());
        assert!(parse(&["port", "eighty"]).is_err());
        assert!(parse(&["port", "70000"]).is_err());

        let (_, params) = parse(&["port", "8443", "--https"])
            .unwrap()
            .command
            .unwrap()
            .into_request();
        assert_eq!(params.get_optional_port("port").unwrap(), Some(8443));
        assert!(params.get_optional_bool("https", false));
    }

    #[test]
    fn test_global_flags_after_verb() {
        let cli = parse(&["secured", "--json", "--config", "/tmp/valet.toml"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.config, PathBuf::from("/tmp/valet.toml"));
        assert_eq!(cli.command.unwrap().name(), "secured");
    }

    #[test]
    fn test_no_verb() {
        let cli = parse(&[]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from(DEFAULT_SETTINGS_PATH));
    }
}
