//! Site routing commands.

mod link;
mod proxy;
mod regenerate;

pub use link::{LinkCommand, LinksCommand, UnlinkCommand};
pub use proxy::{ProxiesCommand, ProxyCommand, UnproxyCommand};
pub use regenerate::RegenerateCommand;
