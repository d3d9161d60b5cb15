//! Change propagation.
//!
//! Any change to the domain, a port, or a site's mode can invalidate many
//! generated files at once. The [`Reconciler`] applies the change and
//! rewrites everything derived from it.

mod reconciler;

pub use reconciler::{DomainChange, Isolation, ProxySite, Reconciler, Unisolation};
