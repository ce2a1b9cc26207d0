//! Checksum store for compile caching
//!
//! A task's record holds the hex SHA-512 of the source that was last
//! compiled. Freshness of `cache/{task}.out` is inferred from this record
//! alone, never from modification times.

use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{IoContext, Result};
use crate::layout::TaskId;

/// Hex-encoded SHA-512 of `source`, 128 characters
pub fn compute_digest(source: &[u8]) -> String {
    format!("{:x}", Sha512::digest(source))
}

/// File name of a task's checksum record, e.g. `a.cc.sha512sum.txt`
pub fn record_file_name(task: &TaskId) -> String {
    format!("{}.cc.sha512sum.txt", task)
}

pub struct ChecksumStore {
    cache_dir: PathBuf,
}

impl ChecksumStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn record_path(&self, task: &TaskId) -> PathBuf {
        self.cache_dir.join(record_file_name(task))
    }

    /// Stored digest for `task`, if a record exists
    pub async fn stored_digest(&self, task: &TaskId) -> Result<Option<String>> {
        let path = self.record_path(task);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).io_context(|| format!("failed to read {}", path.display())),
        }
    }

    /// True unless the stored record matches the digest of `source` exactly
    pub async fn needs_rebuild(&self, task: &TaskId, source: &[u8]) -> Result<bool> {
        self.is_stale(task, &compute_digest(source)).await
    }

    /// Same as `needs_rebuild`, for a digest already computed
    pub async fn is_stale(&self, task: &TaskId, digest: &str) -> Result<bool> {
        let stale = match self.stored_digest(task).await? {
            Some(stored) => stored != digest,
            None => true,
        };

        debug!("Checksum for task {}: stale={}", task, stale);
        Ok(stale)
    }

    /// Overwrite the record for `task` with `digest`, no trailing newline
    pub async fn record_build(&self, task: &TaskId, digest: &str) -> Result<()> {
        let path = self.record_path(task);
        fs::write(&path, digest)
            .await
            .io_context(|| format!("failed to write {}", path.display()))
    }
}
