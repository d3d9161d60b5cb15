//! Input validation module.
//!
//! Everything a user types that ends up in a file name or an Nginx directive
//! passes through here first.

mod domain;
mod upstream;

pub use domain::{validate_site_name, validate_tld};
pub use upstream::validate_upstream;
