//! Show or change the listening ports.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `port [n] [--https]`
pub struct PortCommand {
    engine: Arc<Engine>,
}

impl PortCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for PortCommand {
    fn name(&self) -> &'static str {
        "port"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        params.get_optional_port("port")?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let https = params.get_optional_bool("https", false);
        let label = if https { "HTTPS" } else { "HTTP" };

        let Some(port) = params.get_optional_port("port")? else {
            let config = self.engine.config.read()?;
            let port = if https { config.https_port } else { config.port };
            return Ok(CommandResult::success(
                port.to_string(),
                json!({ "port": config.port, "https_port": config.https_port }),
            ));
        };

        let report = self.engine.reconciler.on_port_change(port, https)?;
        Ok(CommandResult::success(
            format!("Your Nginx {} port has been updated to [{}].", label, port),
            json!({ "port": port, "https": https, "report": report }),
        ))
    }
}
