//! Per-site Nginx configuration.
//!
//! Site state is never stored separately: it is re-derived from the marker
//! header of each generated file whenever it is needed.

mod marker;
mod mode;
mod store;

pub use marker::{decode, encode, stub_name};
pub use mode::{SiteMode, SiteRecord};
pub use store::{LinkedSite, RegenerationReport, SiteConfigStore, SiteScan, SkippedSite};
