//! PHP versions and their FPM pools.

mod pool;
mod registry;
mod version;

pub use pool::{pool_file_name, PoolLocator};
pub use registry::{SwitchOptions, SwitchOutcome, VersionRegistry};
pub use version::{
    normalize, socket_file_name, socket_path, version_digits, SupportedVersions,
    DEFAULT_SUPPORTED_VERSIONS, ISOLATION_SUPPORTED_VERSIONS,
};
