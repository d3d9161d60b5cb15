//! Command registry for dispatching CLI verbs to handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info, info_span};

use crate::cli::Verb;
use crate::engine::Engine;
use crate::error::{CommandErrorKind, ValetError, ValetResult};

use super::nginx::{
    LinkCommand, LinksCommand, ProxiesCommand, ProxyCommand, RegenerateCommand, UnlinkCommand,
    UnproxyCommand,
};
use super::php::{IsolateCommand, IsolatedCommand, UnisolateCommand, UseCommand};
use super::ssl::{SecureCommand, SecuredCommand, UnsecureCommand};
use super::system::{DomainCommand, PortCommand};
use super::traits::Command;
use super::types::{CommandParams, CommandResult, ExecutionContext};

/// Registry of all available commands.
#[derive(Clone)]
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a registry with every built-in command bound to `engine`.
    pub fn new(engine: Arc<Engine>) -> Self {
        let mut registry = Self {
            commands: BTreeMap::new(),
        };

        // PHP
        registry.register(Arc::new(UseCommand::new(engine.clone())));
        registry.register(Arc::new(IsolateCommand::new(engine.clone())));
        registry.register(Arc::new(UnisolateCommand::new(engine.clone())));
        registry.register(Arc::new(IsolatedCommand::new(engine.clone())));

        // Global parameters
        registry.register(Arc::new(DomainCommand::new(engine.clone())));
        registry.register(Arc::new(PortCommand::new(engine.clone())));

        // Certificates
        registry.register(Arc::new(SecureCommand::new(engine.clone())));
        registry.register(Arc::new(UnsecureCommand::new(engine.clone())));
        registry.register(Arc::new(SecuredCommand::new(engine.clone())));

        // Sites
        registry.register(Arc::new(LinkCommand::new(engine.clone())));
        registry.register(Arc::new(UnlinkCommand::new(engine.clone())));
        registry.register(Arc::new(LinksCommand::new(engine.clone())));
        registry.register(Arc::new(ProxyCommand::new(engine.clone())));
        registry.register(Arc::new(UnproxyCommand::new(engine.clone())));
        registry.register(Arc::new(ProxiesCommand::new(engine.clone())));
        registry.register(Arc::new(RegenerateCommand::new(engine)));

        debug!(count = registry.commands.len(), "Command registry initialized");
        registry
    }

    fn register(&mut self, command: Arc<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    /// Get a command by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(name).cloned()
    }

    /// Run a parsed command line verb.
    pub fn dispatch_verb(&self, verb: Verb) -> ValetResult<CommandResult> {
        let (command_name, params) = verb.into_request();
        self.dispatch(&ExecutionContext::new(command_name), command_name, params)
    }

    /// Dispatch a request to the appropriate command handler.
    pub fn dispatch(
        &self,
        ctx: &ExecutionContext,
        command_name: &str,
        params: CommandParams,
    ) -> ValetResult<CommandResult> {
        let command = self.lookup(command_name)?;

        let span = info_span!(
            "command",
            request_id = %ctx.request_id,
            command = command_name,
            started = %ctx.timestamp.to_rfc3339()
        );
        let _guard = span.enter();

        command.validate(&params)?;
        let result = command.execute(ctx, params)?;

        if command.mutates() {
            info!("Command completed");
        } else {
            debug!("Command completed");
        }
        Ok(result)
    }

    /// All command names, sorted.
    pub fn list_commands(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    fn lookup(&self, command_name: &str) -> ValetResult<&Arc<dyn Command>> {
        self.commands
            .get(command_name)
            .ok_or_else(|| ValetError::Command {
                kind: CommandErrorKind::UnknownCommand {
                    name: command_name.to_string(),
                },
            })
    }
}
