//! Global parameter commands.

mod domain;
mod port;

pub use domain::DomainCommand;
pub use port::PortCommand;
