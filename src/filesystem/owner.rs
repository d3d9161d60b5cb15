//! Developer account resolution.

use std::path::PathBuf;

use nix::unistd::{getuid, Gid, Group, User};
use tracing::debug;

/// The non-privileged account that owns Valet's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

impl Owner {
    /// Resolve the developer account: `SUDO_USER` when running under sudo,
    /// otherwise the current user.
    pub fn detect() -> Option<Self> {
        if let Ok(name) = std::env::var("SUDO_USER") {
            if let Ok(Some(user)) = User::from_name(&name) {
                debug!(user = %name, "Resolved developer user from SUDO_USER");
                return Some(Self::from_user(user));
            }
        }
        Self::current()
    }

    /// The account this process runs as.
    pub fn current() -> Option<Self> {
        User::from_uid(getuid()).ok().flatten().map(Self::from_user)
    }

    /// Name of the account's primary group, falling back to the user name.
    pub fn group_name(&self) -> String {
        Group::from_gid(Gid::from_raw(self.gid))
            .ok()
            .flatten()
            .map(|g| g.name)
            .unwrap_or_else(|| self.name.clone())
    }

    fn from_user(user: User) -> Self {
        Self {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
        }
    }
}
