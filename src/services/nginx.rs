//! Nginx service handling.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ValetError, ValetResult};
use crate::executor::{CommandRunner, SubprocessBuilder};

use super::traits::ServiceManager;

/// Systemd unit name of the web server.
pub const NGINX_SERVICE: &str = "nginx";

/// Restarts Nginx, refusing to do so when the configuration does not parse.
pub struct NginxService {
    services: Arc<dyn ServiceManager>,
    runner: Arc<dyn CommandRunner>,
}

impl NginxService {
    pub fn new(services: Arc<dyn ServiceManager>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { services, runner }
    }

    /// Run `nginx -t`.
    pub fn test_config(&self) -> ValetResult<()> {
        debug!("Testing nginx configuration");
        let result = self
            .runner
            .run(SubprocessBuilder::new("nginx").arg("-t"))?;

        if !result.success {
            warn!(stderr = %result.stderr.trim(), "nginx configuration test failed");
            return Err(ValetError::ServiceUnavailable {
                service: NGINX_SERVICE.to_string(),
                action: "validated",
                exit_code: result.exit_code,
                output: result.diagnostic(),
            });
        }
        Ok(())
    }

    pub fn restart(&self) -> ValetResult<()> {
        self.test_config()?;
        self.services.restart(NGINX_SERVICE)
    }
}
