//! Proxied sites.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::sites::SiteMode;
use crate::validation::{validate_site_name, validate_upstream};

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `proxy <site> <url> [--secure]`
pub struct ProxyCommand {
    engine: Arc<Engine>,
}

impl ProxyCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for ProxyCommand {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.get_string("site")?)?;
        validate_upstream(&params.get_string("url")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let proxy = self.engine.reconciler.proxy(
            &params.get_string("site")?,
            &params.get_string("url")?,
            params.get_optional_bool("secure", false),
        )?;
        let scheme = if proxy.secured { "https" } else { "http" };
        Ok(CommandResult::success(
            format!(
                "Valet will now proxy [{}://{}] traffic to [{}].",
                scheme, proxy.hostname, proxy.upstream
            ),
            json!(proxy),
        ))
    }
}

/// `unproxy <site>`
pub struct UnproxyCommand {
    engine: Arc<Engine>,
}

impl UnproxyCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for UnproxyCommand {
    fn name(&self) -> &'static str {
        "unproxy"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.get_string("site")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let site = params.get_string("site")?;
        let host = self.engine.reconciler.hostname(&site)?;
        let removed = self.engine.reconciler.unproxy(&site)?;
        let message = if removed {
            format!("Valet will no longer proxy [{}].", host)
        } else {
            format!("[{}] is not proxied.", host)
        };
        Ok(CommandResult::success(message, json!({ "hostname": host, "removed": removed })))
    }
}

/// `proxies`
pub struct ProxiesCommand {
    engine: Arc<Engine>,
}

impl ProxiesCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for ProxiesCommand {
    fn name(&self) -> &'static str {
        "proxies"
    }

    fn validate(&self, _params: &CommandParams) -> ValetResult<()> {
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, _params: CommandParams) -> ValetResult<CommandResult> {
        let proxies = self.engine.sites.proxies()?;
        let lines: Vec<String> = proxies
            .iter()
            .filter_map(|record| match &record.mode {
                SiteMode::Proxy { upstream } => {
                    let scheme = if record.secured { "https" } else { "http" };
                    Some(format!("{}://{}  ->  {}", scheme, record.hostname, upstream))
                }
                _ => None,
            })
            .collect();

        let message = if lines.is_empty() {
            "No sites are proxied.".to_string()
        } else {
            lines.join("\n")
        };
        Ok(CommandResult::success(message, json!(proxies)))
    }

    fn mutates(&self) -> bool {
        false
    }
}
