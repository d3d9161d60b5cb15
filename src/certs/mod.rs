//! Local certificate authority.
//!
//! Layout under the Valet home:
//!
//! ```text
//! CA/ValetCASelfSigned.{pem,key,srl}
//! Certificates/<host>.{key,csr,crt,conf}
//! ```

mod authority;
mod layout;
mod trust;

pub use authority::{CertificateAuthority, RootStatus};
pub use layout::{LeafPaths, RootPaths, CA_FILE_STEM, LEAF_EXTENSIONS};
pub use trust::{DisabledTrustStore, SystemTrustStore, TrustStore};
