//! Local runner implementation
//!
//! Executes programs directly on the host, without a sandbox.

use async_trait::async_trait;
use std::io::Read;
use std::process::{ExitStatus, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{CommandSpec, RunOptions, RunOutcome, RunStatus, Runner};
use crate::error::{ActError, IoContext, Result};

/// Runner that executes programs directly on the host
#[derive(Debug, Default, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(
        &self,
        cmd: &CommandSpec,
        stdin: &[u8],
        options: &RunOptions,
    ) -> Result<RunOutcome> {
        debug!("Running program: {:?}", cmd.to_vec());

        // stdout and stderr share one pipe so the output keeps its write order
        let (mut reader, out_writer) =
            std::io::pipe().io_context(|| "failed to create output pipe")?;
        let err_writer = out_writer
            .try_clone()
            .io_context(|| "failed to duplicate output pipe")?;

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::from(out_writer))
            .stderr(Stdio::from(err_writer))
            .kill_on_drop(true);

        let spawned = command.spawn();
        // The command keeps our copies of the write ends until dropped; the
        // reader only sees end of file once they are closed.
        drop(command);
        let mut child = spawned.map_err(|e| ActError::Run {
            message: format!("failed to spawn {}: {}", cmd.program.display(), e),
        })?;

        // Dropping the handle closes the pipe.
        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_vec();
            tokio::spawn(async move {
                let res = pipe.write_all(&input).await;
                drop(pipe);
                res
            })
        });

        let drain = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).map(|_| buf)
        });

        let wait = child.wait();
        let exit_status = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                ActError::Run {
                    message: format!(
                        "{} did not finish within {:?}",
                        cmd.program.display(),
                        limit
                    ),
                }
            })?,
            None => wait.await,
        }
        .map_err(|e| ActError::Run {
            message: format!("failed to wait for {}: {}", cmd.program.display(), e),
        })?;

        let output = drain
            .await
            .map_err(|e| ActError::Run {
                message: format!("output reader panicked: {}", e),
            })?
            .io_context(|| format!("failed to read output of {}", cmd.program.display()))?;

        if let Some(writer) = writer {
            match writer.await {
                Ok(Ok(())) => {}
                // The program exited without reading all of its input
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    warn!("{} closed stdin early", cmd.program.display());
                }
                Ok(Err(e)) => {
                    return Err(ActError::io(
                        format!("failed to write stdin of {}", cmd.program.display()),
                        e,
                    ))
                }
                Err(e) => {
                    return Err(ActError::Run {
                        message: format!("stdin writer panicked: {}", e),
                    })
                }
            }
        }

        let status = to_run_status(exit_status);
        debug!("{} finished with {}", cmd.program.display(), status);

        Ok(RunOutcome { status, output })
    }
}

#[cfg(unix)]
fn to_run_status(status: ExitStatus) -> RunStatus {
    use std::os::unix::process::ExitStatusExt;

    match (status.code(), status.signal()) {
        (Some(code), _) => RunStatus::Exited(code),
        (None, Some(sig)) => RunStatus::Signaled(sig),
        (None, None) => RunStatus::Exited(-1),
    }
}

#[cfg(not(unix))]
fn to_run_status(status: ExitStatus) -> RunStatus {
    RunStatus::Exited(status.code().unwrap_or(-1))
}
