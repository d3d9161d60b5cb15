//! Configuration module for Valet.
//!
//! Engine settings come from an optional TOML file; the fleet's global
//! parameters live in `config.json` inside the Valet home directory.

mod global;
mod settings;

pub use global::*;
pub use settings::*;
