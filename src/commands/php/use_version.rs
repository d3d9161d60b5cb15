//! Switch the default PHP version.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::php::{normalize, SwitchOptions};

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `use <version> [--update-cli] [--no-install]`
///
/// Installs the FPM package if needed, rewrites every site for the new
/// socket and stops the old FPM once nothing uses it.
pub struct UseCommand {
    engine: Arc<Engine>,
}

impl UseCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for UseCommand {
    fn name(&self) -> &'static str {
        "use"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        let version = normalize(&params.get_string("version")?)?;
        self.engine.php.supported().validate_default(&version)?;
        Ok(())
    }

    fn execute(&self, ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let options = SwitchOptions {
            install_if_missing: !params.get_optional_bool("no_install", false),
            update_cli: params.get_optional_bool("update_cli", false),
        };
        let requested = params.get_string("version")?;
        debug!(request_id = %ctx.request_id, version = %requested, ?options, "Switching PHP");

        let outcome = self.engine.php.switch_default(&requested, options)?;

        let mut message = format!("Valet is now using PHP {}.", outcome.current);
        if outcome.stopped_previous {
            message.push_str(&format!(" Stopped unused PHP {}.", outcome.previous));
        }
        if !outcome.report.skipped.is_empty() {
            message.push_str(&format!(
                " Skipped {} unreadable site file(s).",
                outcome.report.skipped.len()
            ));
        }
        Ok(CommandResult::success(message, json!(outcome)))
    }
}
