//! Filesystem adapter.
//!
//! Thin wrapper over `std::fs` whose `*_as_user` variants hand ownership of
//! what they create to the developer account, since the engine usually runs
//! under `sudo`.

mod owner;

pub use owner::Owner;

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ValetResult;

/// Filesystem operations with optional ownership hand-off.
#[derive(Debug, Clone, Default)]
pub struct Filesystem {
    owner: Option<Owner>,
}

impl Filesystem {
    /// Create an adapter. `owner` is applied by the `*_as_user` variants.
    pub fn new(owner: Option<Owner>) -> Self {
        Self { owner }
    }

    /// The developer account files are handed to, if any.
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    pub fn is_link(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    pub fn read(&self, path: &Path) -> ValetResult<String> {
        Ok(fs::read_to_string(path)?)
    }

    /// Read a file, treating absence as `None`.
    pub fn read_optional(&self, path: &Path) -> ValetResult<Option<String>> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write a file, creating parent directories.
    pub fn write(&self, path: &Path, contents: &str) -> ValetResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn write_as_user(&self, path: &Path, contents: &str) -> ValetResult<()> {
        self.write(path, contents)?;
        self.hand_to_user(path);
        Ok(())
    }

    pub fn ensure_dir(&self, path: &Path) -> ValetResult<()> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    pub fn ensure_dir_as_user(&self, path: &Path) -> ValetResult<()> {
        self.ensure_dir(path)?;
        self.hand_to_user(path);
        Ok(())
    }

    pub fn copy(&self, from: &Path, to: &Path) -> ValetResult<()> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
        Ok(())
    }

    /// Point `link` at `target`, replacing whatever `link` was before.
    pub fn symlink(&self, target: &Path, link: &Path) -> ValetResult<()> {
        if self.is_link(link) || link.is_file() {
            fs::remove_file(link)?;
        }
        if let Some(parent) = link.parent() {
            fs::create_dir_all(parent)?;
        }
        unix_fs::symlink(target, link)?;
        Ok(())
    }

    pub fn symlink_as_user(&self, target: &Path, link: &Path) -> ValetResult<()> {
        self.symlink(target, link)?;
        self.hand_to_user(link);
        Ok(())
    }

    /// Target of a symlink, if `path` is one.
    pub fn read_link(&self, path: &Path) -> Option<PathBuf> {
        fs::read_link(path).ok()
    }

    /// Remove a file or symlink. Returns whether something was removed.
    pub fn remove(&self, path: &Path) -> ValetResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!(path = %path.display(), "Removed file");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Sorted entry names of a directory; a missing directory is empty.
    pub fn scandir(&self, path: &Path) -> ValetResult<Vec<String>> {
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Give `path` to the developer account. Failures are logged, not raised.
    pub fn hand_to_user(&self, path: &Path) {
        let Some(owner) = &self.owner else {
            return;
        };
        if let Err(e) = unix_fs::lchown(path, Some(owner.uid), Some(owner.gid)) {
            warn!(
                path = %path.display(),
                user = %owner.name,
                error = %e,
                "Failed to hand file to developer user"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(None);
        let path = dir.path().join("a/b/c.txt");

        fs.write(&path, "hello").unwrap();
        assert_eq!(fs.read(&path).unwrap(), "hello");
    }

    #[test]
    fn test_remove_missing_is_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(None);
        assert!(!fs.remove(&dir.path().join("nothing")).unwrap());
    }

    #[test]
    fn test_symlink_replaces_existing_link() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(None);
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs.ensure_dir(&first).unwrap();
        fs.ensure_dir(&second).unwrap();

        let link = dir.path().join("links/site");
        fs.symlink(&first, &link).unwrap();
        fs.symlink(&second, &link).unwrap();

        assert!(fs.is_link(&link));
        assert_eq!(std::fs::read_link(&link).unwrap(), second);
    }

    #[test]
    fn test_scandir_sorted_and_missing_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(None);
        fs.write(&dir.path().join("b"), "").unwrap();
        fs.write(&dir.path().join("a"), "").unwrap();

        assert_eq!(fs.scandir(dir.path()).unwrap(), vec!["a", "b"]);
        assert!(fs.scandir(&dir.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_as_user_with_current_user() {
        let dir = tempfile::tempdir().unwrap();
        let fs = Filesystem::new(Owner::current());
        let path = dir.path().join("owned.txt");

        fs.write_as_user(&path, "x").unwrap();
        assert!(fs.exists(&path));
    }
}
