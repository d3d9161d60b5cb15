//! Command executor module.
//!
//! Handles subprocess spawning, execution timeouts and retries.

mod output;
mod retry;
mod runner;
mod subprocess;

pub use output::sanitize_output;
pub use retry::retry;
pub use runner::{CommandRunner, SystemRunner};
pub use subprocess::{SubprocessBuilder, SubprocessResult};
