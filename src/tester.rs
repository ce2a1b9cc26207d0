//! Tester module for running a task against one sample
//!
//! Locates the files of a `(task, sample)` pair, recompiles the task only
//! when its source digest changed, runs the executable on the sample input
//! and compares the output byte for byte with the expected output.
//!
//! Two runs for the same task at the same time race on `cache/`; the last
//! writer wins. There is no locking.

use serde::Serialize;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info};

use crate::checksum::{compute_digest, ChecksumStore};
use crate::compiler::{Compiler, CxxCompiler};
use crate::config::{Config, RecordOrder};
use crate::error::{ActError, IoContext, Result};
use crate::layout::{SampleId, TaskId, TaskPaths};
use crate::runner::{LocalRunner, RunOptions, Runner};

/// Result of testing one sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestReport {
    pub task: String,
    pub sample: String,
    /// Combined stdout and stderr of the program
    pub output: String,
    pub expected: String,
    /// Exact byte equality, no trimming
    pub matched: bool,
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[output]")?;
        writeln!(f, "{}", self.output)?;
        writeln!(f, "[expected]")?;
        writeln!(f, "{}", self.expected)?;
        writeln!(f, "[diff]")?;
        writeln!(f, "{}", self.matched)?;
        writeln!(f)
    }
}

pub struct Tester<C = CxxCompiler, R = LocalRunner> {
    config: Config,
    checksums: ChecksumStore,
    compiler: C,
    runner: R,
}

impl Tester {
    /// Tester using the configured compiler and direct local execution
    pub fn from_config(config: Config) -> Self {
        let compiler = CxxCompiler::new(config.compiler.clone());
        Self::new(config, compiler, LocalRunner::new())
    }
}

impl<C: Compiler, R: Runner> Tester<C, R> {
    pub fn new(config: Config, compiler: C, runner: R) -> Self {
        let checksums = ChecksumStore::new(config.cache_path());
        Self {
            config,
            checksums,
            compiler,
            runner,
        }
    }

    /// Build (if needed) and run `task` against sample `sample`
    pub async fn run_test(&self, task: &str, sample: &str) -> Result<TestReport> {
        let task = TaskId::new(task)?;
        let sample = SampleId::new(sample)?;
        let paths = TaskPaths::resolve(&self.config, &task, &sample);

        for path in paths.required() {
            ensure_exists(path).await?;
        }

        ensure_dir(&paths.cache_dir).await?;

        self.build_if_needed(&task, &paths).await?;

        let input = read_file(&paths.sample_input).await?;
        let options = RunOptions::with_timeout(self.config.run_timeout);
        let output = self
            .runner
            .run_with_input(&paths.executable, &input, &options)
            .await?;

        let expected = read_file(&paths.sample_output).await?;
        let matched = output == expected;
        info!("Task {} sample {}: matched={}", task, sample, matched);

        Ok(TestReport {
            task: task.to_string(),
            sample: sample.to_string(),
            output: String::from_utf8_lossy(&output).into_owned(),
            expected: String::from_utf8_lossy(&expected).into_owned(),
            matched,
        })
    }

    /// Compile the task unless its checksum record matches the current source.
    /// Returns whether the compiler ran.
    async fn build_if_needed(&self, task: &TaskId, paths: &TaskPaths) -> Result<bool> {
        let source = read_file(&paths.source).await?;
        let digest = compute_digest(&source);

        if !self.checksums.is_stale(task, &digest).await? {
            debug!("Source {} unchanged, using cached binary", paths.source.display());
            return Ok(false);
        }

        match self.config.record_order {
            RecordOrder::BeforeCompile => {
                self.checksums.record_build(task, &digest).await?;
                self.compiler
                    .compile(&paths.source, &paths.executable)
                    .await?;
            }
            RecordOrder::AfterCompile => {
                self.compiler
                    .compile(&paths.source, &paths.executable)
                    .await?;
                self.checksums.record_build(task, &digest).await?;
            }
        }

        info!("Compiled successfully: {}", paths.executable.display());
        Ok(true)
    }
}

async fn ensure_exists(path: &Path) -> Result<()> {
    match fs::metadata(path).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ActError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(e).io_context(|| format!("failed to stat {}", path.display())),
    }
}

async fn ensure_dir(dir: &Path) -> Result<()> {
    if fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }

    info!("mkdir: {}", dir.display());
    fs::create_dir_all(dir)
        .await
        .io_context(|| format!("failed to create {}", dir.display()))
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .io_context(|| format!("failed to read {}", path.display()))
}
