//! Tool configuration
//!
//! Defaults, then an optional `act.toml` in the working root, then
//! environment variables. Command line flags are applied by the binary.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::error::{ActError, IoContext, Result};

/// Name of the optional configuration file looked up in the root directory
pub const CONFIG_FILE_NAME: &str = "act.toml";

/// When the checksum record is written relative to the compiler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    /// Record only once the compiler succeeded
    #[default]
    AfterCompile,
    /// Record before compiling, so a failed build still marks the digest as built
    BeforeCompile,
}

impl std::str::FromStr for RecordOrder {
    type Err = ActError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "after_compile" | "after" => Ok(RecordOrder::AfterCompile),
            "before_compile" | "before" => Ok(RecordOrder::BeforeCompile),
            other => Err(ActError::Config(format!("unknown record order: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding `{task}.cc`, `sample/` and `cache/`
    pub root: PathBuf,
    /// Sample directory, relative to `root`
    pub sample_dir: PathBuf,
    /// Cache directory, relative to `root`
    pub cache_dir: PathBuf,
    /// Compiler program; flags are fixed
    pub compiler: String,
    pub record_order: RecordOrder,
    /// None runs the subject program to completion
    pub run_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            sample_dir: PathBuf::from("sample"),
            cache_dir: PathBuf::from("cache"),
            compiler: "g++".to_string(),
            record_order: RecordOrder::default(),
            run_timeout: None,
        }
    }
}

/// Raw TOML configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    sample_dir: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    compiler: Option<String>,
    record_order: Option<RecordOrder>,
    run_timeout_secs: Option<u64>,
}

impl Config {
    /// Config rooted at `root` with every other field defaulted
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Load `act.toml` from `root` if present, then apply environment overrides
    pub fn load(root: impl Into<PathBuf>) -> Result<Self> {
        let mut config = Self::with_root(root);

        let file = config.root.join(CONFIG_FILE_NAME);
        if file.is_file() {
            let content = std::fs::read_to_string(&file)
                .io_context(|| format!("failed to read {}", file.display()))?;
            config.apply_toml(&content)?;
            debug!("Loaded configuration from {}", file.display());
        }

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_toml(&mut self, content: &str) -> Result<()> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ActError::Config(e.to_string()))?;

        if let Some(dir) = raw.sample_dir {
            self.sample_dir = dir;
        }
        if let Some(dir) = raw.cache_dir {
            self.cache_dir = dir;
        }
        if let Some(compiler) = raw.compiler {
            self.compiler = compiler;
        }
        if let Some(order) = raw.record_order {
            self.record_order = order;
        }
        if let Some(secs) = raw.run_timeout_secs {
            self.run_timeout = Some(Duration::from_secs(secs));
        }
        Ok(())
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(compiler) = var("ACT_CXX").filter(|s| !s.is_empty()) {
            self.compiler = compiler;
        }
        if let Some(order) = var("ACT_RECORD_ORDER").filter(|s| !s.is_empty()) {
            self.record_order = order.parse()?;
        }
        if let Some(secs) = var("ACT_RUN_TIMEOUT_SECS").filter(|s| !s.is_empty()) {
            let secs = secs.trim().parse::<u64>().map_err(|_| {
                ActError::Config(format!("ACT_RUN_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            self.run_timeout = Some(Duration::from_secs(secs));
        }
        Ok(())
    }

    pub fn sample_path(&self) -> PathBuf {
        self.root.join(&self.sample_dir)
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join(&self.cache_dir)
    }
}
