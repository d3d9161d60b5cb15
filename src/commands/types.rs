//! Command types: parameters, results, and execution context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ValetError, ValetResult, ValidationErrorKind};

/// Wrapper around command parameters with helper methods.
///
/// Parameters are kept as a JSON object so that a command sees the same
/// shape whether it was built by [`crate::cli::Verb`] or by hand.
#[derive(Debug, Clone)]
pub struct CommandParams {
    inner: serde_json::Value,
}

impl CommandParams {
    /// Create new command parameters from a JSON value.
    pub fn new(value: serde_json::Value) -> Self {
        Self { inner: value }
    }

    /// Get a required string parameter.
    pub fn get_string(&self, key: &str) -> ValetResult<String> {
        self.get_optional_string(key).ok_or_else(|| missing(key))
    }

    /// Get an optional string parameter.
    pub fn get_optional_string(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Get an optional boolean parameter with a default.
    pub fn get_optional_bool(&self, key: &str, default: bool) -> bool {
        self.inner
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Get an optional port number in `1..=65535`.
    pub fn get_optional_port(&self, key: &str) -> ValetResult<Option<u16>> {
        let Some(raw) = self.inner.get(key).filter(|v| !v.is_null()) else {
            return Ok(None);
        };
        raw.as_u64()
            .and_then(|port| u16::try_from(port).ok())
            .filter(|port| *port != 0)
            .map(Some)
            .ok_or_else(|| {
                ValetError::invalid_parameter(key, format!("'{}' is not a valid port", raw))
            })
    }

    /// A site argument, defaulting to the name of the current directory.
    pub fn site_or_cwd(&self, key: &str) -> ValetResult<String> {
        if let Some(site) = self.get_optional_string(key) {
            return Ok(site);
        }
        let cwd = std::env::current_dir()?;
        cwd.file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| missing(key))
    }
}

fn missing(key: &str) -> ValetError {
    ValetError::Validation {
        kind: ValidationErrorKind::MissingParameter {
            param: key.to_string(),
        },
    }
}

/// Result of command execution.
#[derive(Debug, Clone, Serialize)]
pub struct CommandResult {
    /// One line for the terminal.
    pub message: String,
    /// Structured result for `--json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CommandResult {
    /// Create a result with data.
    pub fn success(message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Execution context for a command.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Unique identifier for this invocation, attached to every log line.
    pub request_id: Uuid,
    /// When the invocation started.
    pub timestamp: DateTime<Utc>,
    /// The command being executed.
    pub command: String,
}

impl ExecutionContext {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            command: command.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required() {
        let params = CommandParams::new(serde_json::json!({}));
        assert!(matches!(
            params.get_string("version"),
            Err(ValetError::Validation {
                kind: ValidationErrorKind::MissingParameter { .. }
            })
        ));
    }

    #[test]
    fn test_port_parsing() {
        let params = CommandParams::new(serde_json::json!({
            "port": 8080,
            "zero": 0,
            "large": 70000,
            "text": "eighty"
        }));
        assert_eq!(params.get_optional_port("port").unwrap(), Some(8080));
        assert_eq!(params.get_optional_port("none").unwrap(), None);
        assert!(params.get_optional_port("zero").is_err());
        assert!(params.get_optional_port("large").is_err());
        assert!(params.get_optional_port("text").is_err());
    }

    #[test]
    fn test_context_ids_are_unique() {
        let a = ExecutionContext::new("use");
        let b = ExecutionContext::new("use");
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.command, "use");
    }
}
