//! List secured sites.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::validation::validate_site_name;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `secured [site]`: every host with a certificate, or whether one site has
/// one.
pub struct SecuredCommand {
    engine: Arc<Engine>,
}

impl SecuredCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for SecuredCommand {
    fn name(&self) -> &'static str {
        "secured"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        if let Some(site) = params.get_optional_string("site") {
            validate_site_name(&site)?;
        }
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        if let Some(site) = params.get_optional_string("site") {
            let host = self.engine.reconciler.hostname(&site)?;
            let secured = self.engine.ca.is_secured(&host);
            let message = if secured {
                format!("{} is secured.", host)
            } else {
                format!("{} is not secured.", host)
            };
            return Ok(CommandResult::success(
                message,
                json!({ "hostname": host, "secured": secured }),
            ));
        }

        let hosts = self.engine.ca.list_secured()?;
        let message = if hosts.is_empty() {
            "No sites are secured.".to_string()
        } else {
            hosts.iter().cloned().collect::<Vec<_>>().join("\n")
        };
        Ok(CommandResult::success(message, json!(hosts)))
    }

    fn mutates(&self) -> bool {
        false
    }
}
