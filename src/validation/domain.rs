//! Hostname component validation.
//!
//! Site names and the pseudo-TLD end up as file names under the Valet home
//! and inside Nginx `server_name` directives.

use crate::error::{ValetError, ValetResult};

/// Maximum length for a full hostname.
const MAX_DOMAIN_LENGTH: usize = 253;

/// Maximum length for a DNS label.
const MAX_LABEL_LENGTH: usize = 63;

/// Validate and normalize the pseudo-TLD.
///
/// A leading dot is dropped and the result is lowercased, so `.Test` becomes
/// `test`. Unlike a public domain, a single label is fine.
pub fn validate_tld(tld: &str) -> ValetResult<String> {
    let tld = tld.trim().trim_start_matches('.').to_ascii_lowercase();
    if tld.is_empty() {
        return Err(ValetError::invalid_parameter("domain", "Domain cannot be empty"));
    }
    check_labels("domain", &tld)?;
    Ok(tld)
}

/// Validate a site name (the part before the pseudo-TLD).
///
/// # Rules
///
/// - 1-253 characters
/// - DNS labels separated by dots; `_` is tolerated since directory names
///   often carry it
/// - No path separators or traversal
pub fn validate_site_name(site_name: &str) -> ValetResult<&str> {
    if site_name.is_empty() {
        return Err(ValetError::invalid_parameter("site", "Site name cannot be empty"));
    }
    if site_name.contains('/') || site_name.contains("..") {
        return Err(ValetError::invalid_parameter(
            "site",
            "Site name must not contain path separators",
        ));
    }
    check_labels("site", site_name)?;
    Ok(site_name)
}

fn check_labels(param: &str, name: &str) -> ValetResult<()> {
    if name.len() > MAX_DOMAIN_LENGTH {
        return Err(ValetError::invalid_parameter(
            param,
            format!("exceeds maximum length of {} characters", MAX_DOMAIN_LENGTH),
        ));
    }
    if name.contains('*') {
        return Err(ValetError::invalid_parameter(param, "Wildcards are not allowed"));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(ValetError::invalid_parameter(
                param,
                "contains an empty label (consecutive dots)",
            ));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(ValetError::invalid_parameter(
                param,
                format!(
                    "label '{}' exceeds maximum length of {} characters",
                    label, MAX_LABEL_LENGTH
                ),
            ));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(ValetError::invalid_parameter(
                param,
                format!("label '{}' must not start or end with a hyphen", label),
            ));
        }
        if let Some(c) = label
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(ValetError::invalid_parameter(
                param,
                format!("contains invalid character '{}'", c),
            ));
        }
    }
    Ok(())
}
