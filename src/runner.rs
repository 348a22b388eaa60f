//! External command execution using `tokio::process`.
//!
//! [`CommandRunner::run`] never fails: spawn errors, timeouts and
//! cancellation come back inside [`CommandOutput::error`]. The child is
//! spawned with `kill_on_drop`, so every early exit (deadline, cancelled
//! scan, dropped future) kills the process.

use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::error::{CheckError, RunError};

/// Exit code reported when the process produced none (not started, killed
/// on timeout or cancellation, terminated by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// Default per-command deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline used when a runner is configured with a zero timeout.
const FALLBACK_TIMEOUT: Duration = Duration::from_secs(45);

/// Captured result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
    pub error: Option<RunError>,
}

impl CommandOutput {
    /// Output of a process that ran to completion.
    pub fn completed(exit_code: i32, stdout: impl Into<Vec<u8>>, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            error: None,
        }
    }

    /// Output of a process that never completed.
    pub fn failed(error: RunError) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: NO_EXIT_CODE,
            error: Some(error),
        }
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// Reports if the command produced any non-blank stdout payload.
    pub fn has_output(&self) -> bool {
        self.stdout.iter().any(|b| !b.is_ascii_whitespace())
    }

    /// Turns a run failure or an exit code outside `accepted` into a
    /// [`CheckError`] labelled with `command`.
    pub fn check(&self, command: &str, accepted: &[i32]) -> Result<(), CheckError> {
        if let Some(error) = &self.error {
            return Err(CheckError::Run {
                command: command.to_string(),
                source: error.clone(),
            });
        }
        if !accepted.contains(&self.exit_code) {
            return Err(CheckError::Exit {
                command: command.to_string(),
                code: self.exit_code,
                stderr: self.stderr_text(),
            });
        }
        Ok(())
    }
}

/// Executes external commands.
///
/// Sources depend on this trait rather than on [`ExecRunner`] so tests can
/// substitute canned output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], cancel: &CancellationToken) -> CommandOutput;
}

/// Runs commands as local subprocesses with a per-command deadline.
#[derive(Debug, Clone)]
pub struct ExecRunner {
    timeout: Duration,
}

impl ExecRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The effective deadline.
    pub fn timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            FALLBACK_TIMEOUT
        } else {
            self.timeout
        }
    }
}

impl Default for ExecRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for ExecRunner {
    #[instrument(skip(self, cancel), level = "debug")]
    async fn run(&self, program: &str, args: &[&str], cancel: &CancellationToken) -> CommandOutput {
        let start = Instant::now();
        let timeout = self.timeout();

        debug!(timeout = ?timeout, "executing command");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                debug!(error = %e, "failed to spawn");
                return CommandOutput::failed(RunError::Spawn {
                    program: program.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        // Dropping this future drops the child, which kills it.
        let wait = tokio::time::timeout(timeout, child.wait_with_output());

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(elapsed = ?start.elapsed(), "cancelled, killing process");
                CommandOutput::failed(RunError::Cancelled)
            }
            result = wait => match result {
                Ok(Ok(output)) => CommandOutput::completed(
                    output.status.code().unwrap_or(NO_EXIT_CODE),
                    output.stdout,
                    output.stderr,
                ),
                Ok(Err(e)) => CommandOutput::failed(RunError::Io {
                    program: program.to_string(),
                    reason: e.to_string(),
                }),
                Err(_) => {
                    warn!(program, timeout = ?timeout, "command timed out");
                    CommandOutput::failed(RunError::Timeout { timeout })
                }
            },
        };

        debug!(
            exit_code = output.exit_code,
            elapsed = ?start.elapsed(),
            "command finished"
        );

        output
    }
}

/// Canned runner for source tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns a fixed [`CommandOutput`] per command line and records every
    /// call. Unknown commands fail as if the binary were missing.
    #[derive(Default)]
    pub struct FakeRunner {
        outputs: HashMap<String, CommandOutput>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, command_line: &str, output: CommandOutput) -> Self {
            self.outputs.insert(command_line.to_string(), output);
            self
        }

        pub fn with_stdout(self, command_line: &str, exit_code: i32, stdout: &str) -> Self {
            self.with(command_line, CommandOutput::completed(exit_code, stdout, ""))
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, program: &str, args: &[&str], _cancel: &CancellationToken) -> CommandOutput {
            let line = std::iter::once(program)
                .chain(args.iter().copied())
                .collect::<Vec<_>>()
                .join(" ");
            self.calls.lock().unwrap().push(line.clone());
            self.outputs.get(&line).cloned().unwrap_or_else(|| {
                CommandOutput::failed(RunError::Spawn {
                    program: program.to_string(),
                    reason: "not found".to_string(),
                })
            })
        }
    }
}
