//! PHP version commands.

mod isolate;
mod isolated;
mod use_version;

pub use isolate::{IsolateCommand, UnisolateCommand};
pub use isolated::IsolatedCommand;
pub use use_version::UseCommand;
