//! CLI command handlers.
//!
//! ## Adding a New Command
//!
//! 1. Create a new file in the appropriate subdirectory (e.g., `php/`, `nginx/`)
//! 2. Implement the `Command` trait
//! 3. Register the command in `CommandRegistry::new()`

mod registry;
mod traits;
mod types;

pub mod nginx;
pub mod php;
pub mod ssl;
pub mod system;

pub use registry::CommandRegistry;
pub use traits::Command;
pub use types::{CommandParams, CommandResult, ExecutionContext};
