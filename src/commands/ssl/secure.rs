//! Secure and unsecure a site.

use std::sync::Arc;

use serde_json::json;

use crate::engine::Engine;
use crate::error::ValetResult;
use crate::validation::validate_site_name;

use super::super::traits::Command;
use super::super::types::{CommandParams, CommandResult, ExecutionContext};

/// `secure [site]`
///
/// Issues a certificate signed by the local CA, creating the CA first if
/// this is the first secured site.
pub struct SecureCommand {
    engine: Arc<Engine>,
}

impl SecureCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for SecureCommand {
    fn name(&self) -> &'static str {
        "secure"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.site_or_cwd("site")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let host = self.engine.reconciler.secure(&params.site_or_cwd("site")?)?;
        Ok(CommandResult::success(
            format!("The [{}] site has been secured with a fresh TLS certificate.", host),
            json!({ "hostname": host, "secured": true }),
        ))
    }
}

/// `unsecure [site]`
pub struct UnsecureCommand {
    engine: Arc<Engine>,
}

impl UnsecureCommand {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl Command for UnsecureCommand {
    fn name(&self) -> &'static str {
        "unsecure"
    }

    fn validate(&self, params: &CommandParams) -> ValetResult<()> {
        validate_site_name(&params.site_or_cwd("site")?)?;
        Ok(())
    }

    fn execute(&self, _ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult> {
        let site = params.site_or_cwd("site")?;
        let host = self.engine.reconciler.hostname(&site)?;
        let revoked = self.engine.reconciler.unsecure(&site)?;

        let message = if revoked {
            format!("The [{}] site will now serve traffic over HTTP.", host)
        } else {
            format!("The [{}] site was not secured.", host)
        };
        Ok(CommandResult::success(
            message,
            json!({ "hostname": host, "revoked": revoked }),
        ))
    }
}
