//! Rebuild every generated file.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `regenerate`: repair after an interrupted change or a stub edit.
pub struct RegenerateCommand {
    engine: Arc<Engine>,
}

impl RegenerateCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for RegenerateCommand {
    fn name(&self) -> &'static str {
        "regenerate"
    }

    fn validate(&self, _params: &CommandParams) -> ValetResult<()> {
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, _params: CommandParams) -> ValetResult<CommandResult> {
        let report = self.engine.reconciler.regenerate()?;
        let mut message = format!("Rewrote {} site file(s).", report.rewritten.len());
        for skipped in &report.skipped {
            message.push_str(&format!("\nSkipped {}: {}", skipped.hostname, skipped.reason));
        }
        Ok(CommandResult::success(message, json!(report)))
    }
}
