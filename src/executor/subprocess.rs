//! Subprocess execution.
//!
//! Runs external commands with:
//! - No shell interpretation (direct exec)
//! - Configurable timeouts
//! - Captured stdout/stderr
//! - Optional `sudo -u` for running as the developer user

use std::collections::HashMap;
use std::fmt;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, ValetError, ValetResult};

use super::output::sanitize_output;

/// Result of a subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl SubprocessResult {
    fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// A successful, silent result.
    pub fn ok() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Sanitized diagnostic output: stderr, or stdout when stderr is empty.
    pub fn diagnostic(&self) -> String {
        let text = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };
        let text = sanitize_output(text.trim(), 5);
        match self.exit_code {
            Some(code) => format!("exit code {}: {}", code, text),
            None => format!("terminated by signal: {}", text),
        }
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct SubprocessBuilder {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout: Duration,
    user: Option<String>,
}

impl SubprocessBuilder {
    /// Create a new subprocess builder.
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout: Duration::from_secs(60),
            user: None,
        }
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: &str) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the command as another user through `sudo -u`.
    pub fn as_user(mut self, user: Option<&str>) -> Self {
        self.user = user.map(|u| u.to_string());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    /// Value following `flag` in the argument list, e.g. `-out <path>`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(|s| s.as_str())
    }

    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// If the process exceeds the configured timeout, it is killed and a
    /// timeout error is returned.
    pub fn run(self) -> ValetResult<SubprocessResult> {
        debug!(
            program = %self.program,
            args = ?self.args,
            user = ?self.user,
            timeout_secs = self.timeout.as_secs(),
            "Executing subprocess"
        );

        let mut cmd = match &self.user {
            Some(user) => {
                let mut cmd = Command::new("sudo");
                cmd.args(["-u", user, "--", &self.program]);
                cmd
            }
            None => Command::new(&self.program),
        };
        cmd.args(&self.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| ValetError::Command {
            kind: CommandErrorKind::ExecutionFailed {
                message: format!("Failed to spawn {}: {}", self.program, e),
            },
        })?;

        let start = Instant::now();
        let poll_interval = Duration::from_millis(50);

        loop {
            match child.try_wait() {
                Ok(Some(_status)) => {
                    let output = child.wait_with_output().map_err(|e| ValetError::Command {
                        kind: CommandErrorKind::ExecutionFailed {
                            message: format!("Failed to get output from {}: {}", self.program, e),
                        },
                    })?;
                    let result = SubprocessResult::from_output(output);
                    debug!(
                        success = result.success,
                        exit_code = ?result.exit_code,
                        duration_ms = start.elapsed().as_millis(),
                        "Subprocess completed"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    if start.elapsed() > self.timeout {
                        warn!(
                            program = %self.program,
                            timeout_secs = self.timeout.as_secs(),
                            "Process timed out, killing"
                        );
                        if let Err(e) = child.kill() {
                            warn!(error = %e, "Failed to kill timed-out process");
                        }
                        let _ = child.wait();
                        return Err(ValetError::Command {
                            kind: CommandErrorKind::Timeout {
                                timeout_secs: self.timeout.as_secs(),
                            },
                        });
                    }
                    std::thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(ValetError::Command {
                        kind: CommandErrorKind::ExecutionFailed {
                            message: format!("Failed to check process status: {}", e),
                        },
                    });
                }
            }
        }
    }
}

impl fmt::Display for SubprocessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_command(program: &str, args: &[&str], timeout: Duration) -> ValetResult<SubprocessResult> {
        SubprocessBuilder::new(program)
            .args(args.iter().copied())
            .timeout(timeout)
            .run()
    }

    #[test]
    fn test_run_echo() {
        let result = run_command("echo", &["hello", "world"], Duration::from_secs(5)).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[test]
    fn test_run_false_command() {
        let result = run_command("false", &[], Duration::from_secs(5)).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn test_nonexistent_command() {
        let result = run_command("nonexistent_command_12345", &[], Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn test_timeout_kills_process() {
        let result = run_command("sleep", &["5"], Duration::from_millis(200));
        assert!(matches!(
            result,
            Err(ValetError::Command {
                kind: CommandErrorKind::Timeout { .. }
            })
        ));
    }

    #[test]
    fn test_env_and_stderr_capture() {
        let result = SubprocessBuilder::new("sh")
            .args(["-c", "echo $VALET_TEST >&2; exit 3"])
            .env("VALET_TEST", "from-env")
            .timeout(Duration::from_secs(5))
            .run()
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.stderr.trim(), "from-env");
        assert_eq!(result.diagnostic(), "exit code 3: from-env");
    }

    #[test]
    fn test_flag_value_and_display() {
        let cmd = SubprocessBuilder::new("openssl").args(["genrsa", "-out", "/tmp/k.key", "2048"]);
        assert_eq!(cmd.flag_value("-out"), Some("/tmp/k.key"));
        assert_eq!(cmd.flag_value("-in"), None);
        assert_eq!(cmd.to_string(), "openssl genrsa -out /tmp/k.key 2048");
    }
}
