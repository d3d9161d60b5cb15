//! Valet Library
//!
//! Site routing, PHP-FPM version management and a local certificate
//! authority for PHP development on Linux. The `valet` binary is a thin CLI
//! over [`commands::CommandRegistry`].

pub mod certs;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod filesystem;
pub mod php;
pub mod reconcile;
pub mod services;
pub mod sites;
pub mod templates;
pub mod validation;
