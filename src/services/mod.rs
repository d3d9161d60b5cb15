//! Service and package manager adapters.
//!
//! ## Adding a Distro
//!
//! 1. Implement `PackageManager` (and `ServiceManager` if it is not systemd)
//! 2. Add its probe binary to the candidate list in `registry.rs`

mod apt;
mod dnf;
mod nginx;
mod php_fpm;
mod registry;
mod systemd;
mod traits;

pub use apt::Apt;
pub use dnf::Dnf;
pub use nginx::{NginxService, NGINX_SERVICE};
pub use php_fpm::{expand, PhpFpmService};
pub use registry::detect_package_manager;
pub use systemd::Systemd;
pub use traits::{PackageManager, ServiceManager};
