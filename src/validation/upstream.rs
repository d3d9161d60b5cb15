//! Proxy upstream validation.

use crate::error::{ValetError, ValetResult};

/// Validate a proxy upstream and return it with a scheme.
///
/// `127.0.0.1:3000` becomes `http://127.0.0.1:3000`. The result is written
/// verbatim into a `proxy_pass` directive, so whitespace, quotes and `;` are
/// rejected.
pub fn validate_upstream(url: &str) -> ValetResult<String> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ValetError::invalid_parameter("url", "Upstream URL cannot be empty"));
    }
    if let Some(c) = url
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, ';' | '"' | '\'' | '{' | '}'))
    {
        return Err(ValetError::invalid_parameter(
            "url",
            format!("contains invalid character '{}'", c),
        ));
    }

    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("http://{}", url)
    };

    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ValetError::invalid_parameter("url", "missing scheme"));
    };
    if !matches!(scheme, "http" | "https") {
        return Err(ValetError::invalid_parameter(
            "url",
            format!("unsupported scheme '{}', use http or https", scheme),
        ));
    }
    if rest.is_empty() || rest.starts_with('/') {
        return Err(ValetError::invalid_parameter("url", "missing host"));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_added() {
        assert_eq!(
            validate_upstream("127.0.0.1:3000").unwrap(),
            "http://127.0.0.1:3000"
        );
        assert_eq!(
            validate_upstream("https://localhost:8443/").unwrap(),
            "https://localhost:8443/"
        );
    }

    #[test]
    fn test_rejected() {
        assert!(validate_upstream("").is_err());
        assert!(validate_upstream("ftp://host").is_err());
        assert!(validate_upstream("http://").is_err());
        assert!(validate_upstream("http://a; include /etc/passwd").is_err());
    }
}
