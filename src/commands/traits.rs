//! Command trait definition.

use crate::error::ValetResult;

use super::types::{CommandParams, CommandResult, ExecutionContext};

/// One CLI verb.
///
/// # Example
///
/// ```ignore
/// pub struct IsolatedCommand {
///     engine: Arc<Engine>,
/// }
///
/// impl Command for IsolatedCommand {
///     fn name(&self) -> &'static str {
///         "isolated"
///     }
///
///     fn validate(&self, _params: &CommandParams) -> ValetResult<()> {
///         Ok(())
///     }
///
///     fn execute(&self, _ctx: &ExecutionContext, _params: CommandParams) -> ValetResult<CommandResult> {
///         let sites = self.engine.sites.isolated_sites()?;
///         Ok(CommandResult::success(format!("{} isolated", sites.len()), json!(sites)))
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// Verb typed on the command line.
    fn name(&self) -> &'static str;

    /// Validate the command parameters before anything is touched.
    fn validate(&self, params: &CommandParams) -> ValetResult<()>;

    /// Execute the command.
    fn execute(&self, ctx: &ExecutionContext, params: CommandParams) -> ValetResult<CommandResult>;

    /// Whether the command changes anything on the machine.
    ///
    /// Read-only listings are logged at debug level only.
    fn mutates(&self) -> bool {
        true
    }
}
