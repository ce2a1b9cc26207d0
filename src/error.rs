//! Error types for the build-and-test cycle
//!
//! Every failure is terminal for the current test run. Nothing here retries;
//! the caller decides whether to exit.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ActError {
    /// Missing or empty identifiers
    #[error("{0}")]
    Argument(String),

    /// A required file does not exist
    #[error("no such file: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// External compiler failed; message is the compiler's own output
    #[error("compile error: {message}")]
    Compile { message: String },

    /// Subject program failed to spawn, exited non-zero or timed out
    #[error("run error: {message}")]
    Run { message: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ActError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ActError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ActError>;

/// Attach a context message to an `io::Result`, in the spirit of `anyhow::Context`.
pub trait IoContext<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| ActError::io(f(), e))
    }
}
