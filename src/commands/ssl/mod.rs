//! Certificate commands.

mod secure;
mod secured;

pub use secure::{SecureCommand, UnsecureCommand};
pub use secured::SecuredCommand;
