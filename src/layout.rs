//! Task and sample identifiers and the on-disk naming convention
//!
//! ```text
//! {task}.cc
//! sample/{task}-{sample}-in.txt
//! sample/{task}-{sample}-out.txt
//! cache/{task}.cc.sha512sum.txt
//! cache/{task}.out
//! ```

use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::{ActError, Result};

/// Task identifier, e.g. "a"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ActError::Argument("taskID is empty".into()));
        }
        Ok(Self(id))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sample identifier, left-padded with zeros to two characters ("1" -> "01")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SampleId(String);

impl SampleId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(ActError::Argument("sampleID is empty".into()));
        }
        Ok(Self(format!("{:0>2}", id)))
    }
}

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every path a single test run touches
#[derive(Debug, Clone, PartialEq)]
pub struct TaskPaths {
    pub source: PathBuf,
    pub sample_input: PathBuf,
    pub sample_output: PathBuf,
    pub cache_dir: PathBuf,
    pub executable: PathBuf,
}

impl TaskPaths {
    pub fn resolve(config: &Config, task: &TaskId, sample: &SampleId) -> Self {
        let source_name = format!("{}.cc", task);
        let sample_dir = config.sample_path();
        let cache_dir = config.cache_path();

        Self {
            source: config.root.join(&source_name),
            sample_input: sample_dir.join(format!("{}-{}-in.txt", task, sample)),
            sample_output: sample_dir.join(format!("{}-{}-out.txt", task, sample)),
            executable: cache_dir.join(format!("{}.out", task)),
            cache_dir,
        }
    }

    /// Files that must exist before anything is compiled or run
    pub fn required(&self) -> [&PathBuf; 3] {
        [&self.source, &self.sample_input, &self.sample_output]
    }
}
