//! Compiler module - Source code compilation
//!
//! Compiles a task's C++ source into `cache/{task}.out` with the flag set the
//! judge uses. The flags are fixed; only the compiler program can be swapped.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{ActError, Result};

/// Flags matching the judge environment:
/// GNU C++17, most and extra warnings, -O2 and `ONLINE_JUDGE` defined.
pub const CXX_FLAGS: [&str; 5] = ["-std=gnu++17", "-Wall", "-Wextra", "-O2", "-DONLINE_JUDGE"];

/// Result of a compilation attempt
#[derive(Debug)]
pub struct CompileResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
}

impl CompileResult {
    /// Message shown to the user when the compile failed
    pub fn error_message(&self) -> String {
        if !self.stderr.is_empty() {
            self.stderr.clone()
        } else if !self.stdout.is_empty() {
            self.stdout.clone()
        } else {
            format!("Compilation failed with exit code {}", self.exit_code)
        }
    }
}

#[async_trait]
pub trait Compiler: Send + Sync {
    /// Compile `source` into the executable `output`.
    /// Any failure, including a non-zero compiler exit, is `ActError::Compile`.
    async fn compile(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Compiles with an external g++-compatible compiler.
///
/// Defaults to `g++` from `PATH`. AtCoder's 2020 language set pinned `g++-9`;
/// set `compiler = "g++-9"` in `act.toml` or `ACT_CXX` to match it exactly.
#[derive(Debug, Clone)]
pub struct CxxCompiler {
    program: String,
}

impl CxxCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Full argument list passed to the compiler
    pub fn args(source: &Path, output: &Path) -> Vec<String> {
        let mut args: Vec<String> = CXX_FLAGS.iter().map(|s| s.to_string()).collect();
        args.push("-o".to_string());
        args.push(output.display().to_string());
        args.push(source.display().to_string());
        args
    }

    pub async fn run_compiler(&self, source: &Path, output: &Path) -> Result<CompileResult> {
        let args = Self::args(source, output);
        debug!("Compiling with command: {} {:?}", self.program, args);

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ActError::Compile {
                message: format!("failed to run {}: {}", self.program, e),
            })?;

        Ok(CompileResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
        })
    }
}

impl Default for CxxCompiler {
    fn default() -> Self {
        Self::new("g++")
    }
}

#[async_trait]
impl Compiler for CxxCompiler {
    async fn compile(&self, source: &Path, output: &Path) -> Result<()> {
        info!("compile {}", source.display());

        let result = self.run_compiler(source, output).await?;
        if !result.success {
            return Err(ActError::Compile {
                message: result.error_message(),
            });
        }

        // Warnings still go somewhere visible
        if !result.stderr.is_empty() {
            debug!("Compiler diagnostics:\n{}", result.stderr);
        }
        Ok(())
    }
}
