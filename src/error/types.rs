//! Error types for Valet.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the engine.
#[derive(Error, Debug)]
pub enum ValetError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A version string had no extractable major/minor digits.
    #[error("Invalid PHP version format: '{input}'")]
    InvalidVersionFormat { input: String },

    /// The version is well formed but not in the applicable allow-list.
    #[error("PHP {version} is not supported {context}. Supported versions: {supported}")]
    UnsupportedVersion {
        version: String,
        context: &'static str,
        supported: String,
    },

    /// None of the candidate FPM pool directories exist.
    #[error("Unable to find a PHP-FPM pool directory for PHP {version} (tried: {tried})")]
    PoolPathNotFound { version: String, tried: String },

    /// A package manager could not install a package.
    #[error("Failed to install package '{package}': {output}")]
    PackageInstallFailed {
        package: String,
        exit_code: Option<i32>,
        output: String,
    },

    /// A service manager operation failed.
    #[error("Service '{service}' could not be {action}: {output}")]
    ServiceUnavailable {
        service: String,
        action: &'static str,
        exit_code: Option<i32>,
        output: String,
    },

    /// The certificate toolchain failed.
    #[error("Certificate signing failed for {subject} during {step}: {output}")]
    CertificateSigningFailed {
        subject: String,
        step: &'static str,
        exit_code: Option<i32>,
        output: String,
    },

    /// The named site is neither linked, parked nor configured.
    #[error("The [{site}] site could not be found in Valet's site paths")]
    SiteNotFound { site: String },

    /// A generated site file could not be decoded.
    #[error("Malformed site configuration {path}: {reason}")]
    MalformedSiteConfig { path: PathBuf, reason: String },

    /// CLI parameter validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// External command execution errors.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Missing required parameter: {param}")]
    MissingParameter { param: String },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Unknown command: {name}")]
    UnknownCommand { name: String },

    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("Command timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },
}

impl ValetError {
    /// Shorthand for an invalid CLI parameter.
    pub fn invalid_parameter(param: &str, message: impl Into<String>) -> Self {
        ValetError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: message.into(),
            },
        }
    }

    /// Shorthand for a failed external invocation.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        ValetError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: message.into(),
            },
        }
    }

    /// Stable machine-readable code used in `--json` output.
    pub fn code(&self) -> &'static str {
        match self {
            ValetError::Config { .. } => "CONFIG_ERROR",
            ValetError::InvalidVersionFormat { .. } => "INVALID_VERSION_FORMAT",
            ValetError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            ValetError::PoolPathNotFound { .. } => "POOL_PATH_NOT_FOUND",
            ValetError::PackageInstallFailed { .. } => "PACKAGE_INSTALL_FAILED",
            ValetError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE",
            ValetError::CertificateSigningFailed { .. } => "CERTIFICATE_SIGNING_FAILED",
            ValetError::SiteNotFound { .. } => "SITE_NOT_FOUND",
            ValetError::MalformedSiteConfig { .. } => "MALFORMED_SITE_CONFIG",
            ValetError::Validation { .. } => "VALIDATION_ERROR",
            ValetError::Command { .. } => "COMMAND_ERROR",
            ValetError::Template { .. } => "TEMPLATE_ERROR",
            ValetError::Io(_) => "IO_ERROR",
            ValetError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type alias for engine operations.
pub type ValetResult<T> = Result<T, ValetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_errors_carry_output() {
        let err = ValetError::PackageInstallFailed {
            package: "php7.4-fpm".to_string(),
            exit_code: Some(100),
            output: "E: Unable to locate package php7.4-fpm".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("php7.4-fpm"));
        assert!(message.contains("Unable to locate package"));
        assert_eq!(err.code(), "PACKAGE_INSTALL_FAILED");
    }

    #[test]
    fn test_unsupported_version_lists_allowed() {
        let err = ValetError::UnsupportedVersion {
            version: "5.3".to_string(),
            context: "for isolation",
            supported: "7.4, 8.2".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "PHP 5.3 is not supported for isolation. Supported versions: 7.4, 8.2"
        );
    }
}
