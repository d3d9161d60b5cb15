//! On-disk certificate layout.

use std::path::{Path, PathBuf};

/// File stem of the root CA inside `<home>/CA`.
pub const CA_FILE_STEM: &str = "ValetCASelfSigned";

/// Extensions that make up one leaf certificate set.
pub const LEAF_EXTENSIONS: [&str; 4] = ["key", "csr", "crt", "conf"];

/// Root CA files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPaths {
    pub pem: PathBuf,
    pub key: PathBuf,
    pub srl: PathBuf,
}

impl RootPaths {
    pub fn new(ca_dir: &Path) -> Self {
        Self {
            pem: ca_dir.join(format!("{}.pem", CA_FILE_STEM)),
            key: ca_dir.join(format!("{}.key", CA_FILE_STEM)),
            srl: ca_dir.join(format!("{}.srl", CA_FILE_STEM)),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.pem, &self.key, &self.srl]
    }
}

/// The four files of a leaf certificate for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPaths {
    pub key: PathBuf,
    pub csr: PathBuf,
    pub crt: PathBuf,
    pub conf: PathBuf,
}

impl LeafPaths {
    pub fn new(certificates_dir: &Path, host: &str) -> Self {
        let file = |ext: &str| certificates_dir.join(format!("{}.{}", host, ext));
        Self {
            key: file("key"),
            csr: file("csr"),
            crt: file("crt"),
            conf: file("conf"),
        }
    }

    pub fn all(&self) -> [&Path; 4] {
        [&self.key, &self.csr, &self.crt, &self.conf]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_paths() {
        let paths = LeafPaths::new(Path::new("/v/Certificates"), "blog.test");
        assert_eq!(paths.crt, PathBuf::from("/v/Certificates/blog.test.crt"));
        assert_eq!(paths.all().len(), LEAF_EXTENSIONS.len());
    }

    #[test]
    fn test_root_paths() {
        let paths = RootPaths::new(Path::new("/v/CA"));
        assert_eq!(paths.srl, PathBuf::from("/v/CA/ValetCASelfSigned.srl"));
    }
}
