//! Process-execution adapter.

use crate::error::ValetResult;

use super::subprocess::{SubprocessBuilder, SubprocessResult};

/// Executes external commands on behalf of the engine.
///
/// Every component that shells out goes through this trait, so tests can
/// substitute a recording fake for the real system.
pub trait CommandRunner: Send + Sync {
    /// Run the command and return its captured result.
    ///
    /// A non-zero exit is *not* an error at this level; callers decide what a
    /// failure means for their operation.
    fn run(&self, command: SubprocessBuilder) -> ValetResult<SubprocessResult>;
}

/// Runs commands on the local machine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: SubprocessBuilder) -> ValetResult<SubprocessResult> {
        command.run()
    }
}
