//! Error types.
//!
//! Failures are split by the layer that produces them:
//!
//! - [`RunError`] - the external command could not be run to completion
//! - [`CheckError`] - a source's update check failed; stored inside
//!   [`CheckResult`](crate::model::CheckResult) instead of being returned
//! - [`ConfigError`] - invalid configuration, detected before any scan

use std::time::Duration;

use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The process could not be started (missing binary, permissions).
    #[error("failed to start {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// The process outlived its deadline and was killed.
    #[error("command timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The governing scan was cancelled while the process was running.
    #[error("command cancelled")]
    Cancelled,

    /// Reading the process output failed.
    #[error("I/O error while waiting for {program}: {reason}")]
    Io { program: String, reason: String },
}

/// Errors reported by a single source's update check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The tool is present but could not be run.
    #[error("{command} failed: {source}")]
    Run {
        command: String,
        #[source]
        source: RunError,
    },

    /// The tool ran but exited with a status the source does not accept.
    #[error("{command} exited with status {code}{}", stderr_suffix(.stderr))]
    Exit {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The tool succeeded but its output could not be parsed.
    #[error("could not parse {command} output: {reason}")]
    Malformed { command: String, reason: String },

    /// The check task itself crashed.
    #[error("update check panicked: {0}")]
    Panicked(String),
}

impl CheckError {
    /// Returns true if the check hit its per-command deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CheckError::Run {
                source: RunError::Timeout { .. },
                ..
            }
        )
    }

    /// Returns true if the check was aborted by cancellation of the scan.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            CheckError::Run {
                source: RunError::Cancelled,
                ..
            }
        )
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let first_line = stderr.trim().lines().next().unwrap_or_default();
    if first_line.is_empty() {
        String::new()
    } else {
        format!(": {}", first_line)
    }
}

/// Configuration errors. These are fatal and reported before scanning.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("interval must be positive")]
    NonPositiveInterval,

    #[error("invalid duration {0:?}: expected a number followed by ms, s, m, h or d")]
    InvalidDuration(String),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_error_includes_first_stderr_line() {
        let err = CheckError::Exit {
            command: "brew outdated --json=v2".to_string(),
            code: 1,
            stderr: "Error: no network\nmore detail\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "brew outdated --json=v2 exited with status 1: Error: no network"
        );
    }

    #[test]
    fn test_exit_error_without_stderr() {
        let err = CheckError::Exit {
            command: "snap refresh --list".to_string(),
            code: 2,
            stderr: "  \n".to_string(),
        };
        assert_eq!(err.to_string(), "snap refresh --list exited with status 2");
    }

    #[test]
    fn test_timeout_is_distinguishable() {
        let err = CheckError::Run {
            command: "npm outdated -g --json".to_string(),
            source: RunError::Timeout {
                timeout: Duration::from_millis(100),
            },
        };
        assert!(err.is_timeout());
        assert!(!err.is_cancelled());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_spawn_failure_is_not_timeout() {
        let err = CheckError::Run {
            command: "pip list".to_string(),
            source: RunError::Spawn {
                program: "pip".to_string(),
                reason: "No such file or directory".to_string(),
            },
        };
        assert!(!err.is_timeout());
        assert!(err.to_string().starts_with("pip list failed: failed to start pip"));
    }
}
