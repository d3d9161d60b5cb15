//! Linked sites.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::validation::validate_site_name;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `link [name] [--path=] [--secure]`
pub struct LinkCommand {
    engine: Arc<Engine>,
}

impl LinkCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for LinkCommand {
    fn name(&self) -> &'static str {
        "link"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.site_or_cwd("name")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let name = params.site_or_cwd("name")?;
        let target = match params.get_optional_string("path") {
            Some(path) => PathBuf::from(path),
            None => std::env::current_dir()?,
        };
        let secure = params.get_optional_bool("secure", false);

        let (link, host) = self.engine.reconciler.link(&name, &target, secure)?;
        Ok(CommandResult::success(
            format!("A [{}] symbolic link has been created; the site is served at {}.", link.name, host),
            json!({ "name": link.name, "link": link.path, "target": target, "hostname": host, "secured": secure }),
        ))
    }
}

/// `unlink [name]`
pub struct UnlinkCommand {
    engine: Arc<Engine>,
}

impl UnlinkCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for UnlinkCommand {
    fn name(&self) -> &'static str {
        "unlink"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.site_or_cwd("name")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let name = params.site_or_cwd("name")?;
        let removed = self.engine.reconciler.unlink(&name)?;
        let message = if removed {
            format!("The [{}] symbolic link has been removed.", name)
        } else {
            format!("There is no [{}] link.", name)
        };
        Ok(CommandResult::success(message, json!({ "name": name, "removed": removed })))
    }
}

/// `links`
pub struct LinksCommand {
    engine: Arc<Engine>,
}

impl LinksCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for LinksCommand {
    fn name(&self) -> &'static str {
        "links"
    }

    fn validate(&self, _params: &CommandParams) -> ValetResult<()> {
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, _params: CommandParams) -> ValetResult<CommandResult> {
        let params = self.engine.config.parameters()?;
        let secured = self.engine.ca.list_secured()?;

        let rows: Vec<_> = self
            .engine
            .sites
            .links()?
            .into_iter()
            .map(|link| {
                let host = params.hostname(&link.name);
                let scheme = if secured.contains(&host) { "https" } else { "http" };
                json!({
                    "name": link.name,
                    "url": format!("{}://{}", scheme, host),
                    "path": link.path,
                    "secured": secured.contains(&host),
                })
            })
            .collect();

        let message = if rows.is_empty() {
            "No sites are linked.".to_string()
        } else {
            rows.iter()
                .map(|row| {
                    format!(
                        "{}  {}  {}",
                        row["name"].as_str().unwrap_or_default(),
                        row["url"].as_str().unwrap_or_default(),
                        row["path"].as_str().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        Ok(CommandResult::success(message, json!(rows)))
    }

    fn mutates(&self) -> bool {
        false
    }
}
