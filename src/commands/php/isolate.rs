//! Per-site PHP isolation.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::php::normalize;
use crate::validation::validate_site_name;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `isolate <version> [--site=] [--secure]`
pub struct IsolateCommand {
    engine: Arc<Engine>,
}

impl IsolateCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for IsolateCommand {
    fn name(&self) -> &'static str {
        "isolate"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        let version = normalize(&params.get_string("version")?)?;
        self.engine.php.supported().validate_isolation(&version)?;
        validate_site_name(&params.site_or_cwd("site")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let site = params.site_or_cwd("site")?;
        let isolation = self.engine.reconciler.on_isolate(
            &site,
            &params.get_string("version")?,
            params.get_optional_bool("secure", false),
        )?;

        let message = format!(
            "The site [{}] is now using PHP {}.",
            isolation.hostname, isolation.php_version
        );
        Ok(CommandResult::success(message, json!(isolation)))
    }
}

/// `unisolate [--site=]`
pub struct UnisolateCommand {
    engine: Arc<Engine>,
}

impl UnisolateCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for UnisolateCommand {
    fn name(&self) -> &'static str {
        "unisolate"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.site_or_cwd("site")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let site = params.site_or_cwd("site")?;
        let outcome = self.engine.reconciler.on_unisolate(&site)?;

        let message = match &outcome.previous_version {
            Some(_) => format!(
                "The site [{}] is now using the default PHP version.",
                outcome.hostname
            ),
            None => format!("The site [{}] is not isolated.", outcome.hostname),
        };
        Ok(CommandResult::success(message, json!(outcome)))
    }
}
