//! List isolated sites.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

pub struct IsolatedCommand {
    engine: Arc<Engine>,
}

impl IsolatedCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for IsolatedCommand {
    fn name(&self) -> &'static str {
        "isolated"
    }

    fn validate(&self, _params: &CommandParams) -> ValetResult<()> {
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, _params: CommandParams) -> ValetResult<CommandResult> {
        let sites = self.engine.sites.isolated_sites()?;
        let message = if sites.is_empty() {
            "No sites are isolated.".to_string()
        } else {
            sites
                .iter()
                .map(|(host, version)| format!("{}  PHP {}", host, version))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let data: Vec<_> = sites
            .into_iter()
            .map(|(hostname, php_version)| json!({"hostname": hostname, "php_version": php_version}))
            .collect();
        Ok(CommandResult::success(message, json!(data)))
    }

    fn mutates(&self) -> bool {
        false
    }
}
