//! Stub templates for Nginx sites, FPM pools and certificate requests.

mod engine;

pub use engine::TemplateEngine;
