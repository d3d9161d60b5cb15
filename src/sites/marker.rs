//! Marker comments of generated site files.
//!
//! The first non-blank line of every site file names the stub it came from:
//!
//! ```text
//! # valet stub: secure.isolated.valet.conf
//! # ISOLATED_PHP_VERSION=7.4
//! ```
//!
//! These two functions are the only code that reads or writes markers.

use std::sync::LazyLock;

use regex::Regex;

use super::mode::SiteMode;

const STUB_PREFIX: &str = "# valet stub:";
const ISOLATION_KEY: &str = "# ISOLATED_PHP_VERSION=";

static STUB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#\s*valet stub:\s*(secure\.)?(?:(plain|proxy|isolated)\.)?valet\.conf\s*$")
        .expect("stub pattern compiles")
});

static ISOLATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^#\s*ISOLATED_PHP_VERSION=(\S+)\s*$").expect("isolation pattern compiles")
});

static PROXY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*proxy_pass\s+([^\s;]+)\s*;").expect("proxy pattern compiles")
});

/// Name of the stub for a mode, e.g. `secure.proxy.valet.conf`.
pub fn stub_name(mode: &SiteMode, secured: bool) -> String {
    let secure = if secured { "secure." } else { "" };
    format!("{}{}.valet.conf", secure, mode.stub_type())
}

/// Marker header to prepend to a rendered site body.
pub fn encode(mode: &SiteMode, secured: bool) -> String {
    let mut header = format!("{} {}\n", STUB_PREFIX, stub_name(mode, secured));
    if let SiteMode::Isolated { php_version } = mode {
        header.push_str(&format!("{}{}\n", ISOLATION_KEY, php_version));
    }
    header
}

/// Recover mode and secured state from a site file's contents.
///
/// The error is a human-readable reason; the caller attaches the path.
pub fn decode(content: &str) -> Result<(SiteMode, bool), String> {
    let first = content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .ok_or_else(|| "file is empty".to_string())?;

    let captures = STUB_PATTERN
        .captures(first)
        .ok_or_else(|| format!("missing stub marker (first line is '{}')", first))?;

    let secured = captures.get(1).is_some();
    let mode = match captures.get(2).map(|m| m.as_str()) {
        // Legacy markers carry no type and mean plain.
        None | Some("plain") => SiteMode::Plain,
        Some("proxy") => {
            let upstream = PROXY_PATTERN
                .captures(content)
                .map(|c| c[1].to_string())
                .ok_or_else(|| "proxy site without a proxy_pass directive".to_string())?;
            SiteMode::Proxy { upstream }
        }
        Some("isolated") => {
            let php_version = ISOLATION_PATTERN
                .captures(content)
                .map(|c| c[1].to_string())
                .ok_or_else(|| "isolated site without ISOLATED_PHP_VERSION".to_string())?;
            SiteMode::Isolated { php_version }
        }
        Some(other) => return Err(format!("unknown stub type '{}'", other)),
    };

    Ok((mode, secured))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_isolated() {
        let mode = SiteMode::Isolated {
            php_version: "7.4".to_string(),
        };
        assert_eq!(
            encode(&mode, true),
            "# valet stub: secure.isolated.valet.conf\n# ISOLATED_PHP_VERSION=7.4\n"
        );
    }

    #[test]
    fn test_decode_proxy_reads_upstream() {
        let content = format!(
            "{}server {{\n    location / {{\n        proxy_pass http://127.0.0.1:3000;\n    }}\n}}\n",
            encode(
                &SiteMode::Proxy {
                    upstream: String::new()
                },
                false
            )
        );
        assert_eq!(
            decode(&content).unwrap(),
            (
                SiteMode::Proxy {
                    upstream: "http://127.0.0.1:3000".to_string()
                },
                false
            )
        );
    }

    #[test]
    fn test_decode_legacy_markers() {
        assert_eq!(
            decode("\n# valet stub: secure.valet.conf\nserver {}\n").unwrap(),
            (SiteMode::Plain, true)
        );
        assert_eq!(
            decode("# valet stub: valet.conf\n").unwrap(),
            (SiteMode::Plain, false)
        );
    }

    #[test]
    fn test_decode_rejects_malformed() {
        assert!(decode("").unwrap_err().contains("empty"));
        assert!(decode("server {}\n").unwrap_err().contains("missing stub marker"));
        assert!(decode("# valet stub: fastcgi.valet.conf\n").is_err());
        assert!(decode("# valet stub: isolated.valet.conf\nserver {}\n")
            .unwrap_err()
            .contains("ISOLATED_PHP_VERSION"));
        assert!(decode("# valet stub: secure.proxy.valet.conf\nserver {}\n")
            .unwrap_err()
            .contains("proxy_pass"));
    }

    #[test]
    fn test_marker_only_counts_on_first_line() {
        let content = "server {}\n# valet stub: plain.valet.conf\n";
        assert!(decode(content).is_err());
    }
}
