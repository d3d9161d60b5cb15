//! Show or change the pseudo-TLD.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::validation::validate_tld;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `domain [name]`
pub struct DomainCommand {
    engine: Arc<Engine>,
}

impl DomainCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for DomainCommand {
    fn name(&self) -> &'static str {
        "domain"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        if let Some(name) = params.get_optional_string("name") {
            validate_tld(&name)?;
        }
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let Some(name) = params.get_optional_string("name") else {
            let domain = self.engine.config.read()?.domain;
            return Ok(CommandResult::success(domain.clone(), json!({ "domain": domain })));
        };

        let change = self.engine.reconciler.on_domain_change(&name)?;
        Ok(CommandResult::success(
            format!("Your Valet domain has been updated to [{}].", change.current),
            json!(change),
        ))
    }
}
