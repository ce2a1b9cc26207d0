//! Runner module - Process execution abstraction
//!
//! This module spawns a program, feeds it stdin and captures its output.
//!
//! The runner module does NOT:
//! - Compare outputs
//! - Decide whether anything needs compiling
//! - Know about tasks or samples

pub mod local;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ActError, Result};

/// Command specification for execution
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program path or name
    pub program: PathBuf,
    /// Arguments to the program
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Program and arguments, for logging
    pub fn to_vec(&self) -> Vec<String> {
        let mut v = vec![self.program.display().to_string()];
        v.extend(self.args.clone());
        v
    }
}

/// Execution options. The default runs the program to completion.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Kill the program and fail once this much wall time has passed
    pub timeout: Option<Duration>,
}

impl RunOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

/// Execution status (raw, no verdict interpretation)
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// Program exited normally with given exit code
    Exited(i32),
    /// Killed by signal
    Signaled(i32),
}

impl RunStatus {
    /// Check if execution was successful (exited with code 0)
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::Exited(0))
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Exited(code) => write!(f, "exit status {}", code),
            RunStatus::Signaled(sig) => write!(f, "killed by signal {}", sig),
        }
    }
}

/// Outcome of running a program
#[derive(Debug)]
pub struct RunOutcome {
    pub status: RunStatus,
    /// Stdout and stderr as one stream, in the order the program wrote them
    pub output: Vec<u8>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Runner trait for executing programs
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command to completion, writing `stdin` in full then closing it
    async fn run(&self, cmd: &CommandSpec, stdin: &[u8], options: &RunOptions)
        -> Result<RunOutcome>;

    /// Run an executable against `input` and return its combined output.
    /// A spawn failure, timeout or non-zero exit is an error.
    async fn run_with_input(
        &self,
        executable: &Path,
        input: &[u8],
        options: &RunOptions,
    ) -> Result<Vec<u8>> {
        let outcome = self.run(&CommandSpec::new(executable), input, options).await?;
        if !outcome.is_success() {
            let output = String::from_utf8_lossy(&outcome.output);
            return Err(ActError::Run {
                message: format!(
                    "{} failed with {}{}",
                    executable.display(),
                    outcome.status,
                    if output.trim().is_empty() {
                        String::new()
                    } else {
                        format!(": {}", output.trim())
                    }
                ),
            });
        }
        Ok(outcome.output)
    }
}

// Re-exports
pub use local::LocalRunner;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("g++").with_args(["-O2", "-o", "a.out", "a.cc"]);

        assert_eq!(cmd.to_vec(), vec!["g++", "-O2", "-o", "a.out", "a.cc"]);
        assert_eq!(cmd.program, PathBuf::from("g++"));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(RunStatus::Exited(1).to_string(), "exit status 1");
        assert_eq!(RunStatus::Signaled(9).to_string(), "killed by signal 9");
        assert!(!RunStatus::Signaled(9).is_success());
    }
}
