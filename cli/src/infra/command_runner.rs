//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` is the production implementation that uses tokio
//! for async process execution with an optional timeout that kills the child.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::debug;

use crate::application::ports::{CommandRunner, ProgressReporter};

/// Production `CommandRunner` backed by `tokio::process`.
///
/// With `timeout == None` commands run until they exit. When a timeout is
/// set and fires, the local child is killed; for `ssh` that only drops the
/// connection, the remote process may keep running.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner {
    timeout: Option<Duration>,
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        if let Some(timeout) = self.timeout {
            return self.run_with_timeout(program, args, timeout).await;
        }
        debug!(program, ?args, "running local command");
        tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run {program}"))
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        debug!(program, ?args, timeout_secs = timeout.as_secs(), "running local command");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for {program}"))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        output: &dyn ProgressReporter,
    ) -> Result<ExitStatus> {
        debug!(program, ?args, "running local command with streamed output");
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout = child.stdout.take().map(|h| BufReader::new(h).lines());
        let mut stderr = child.stderr.take().map(|h| BufReader::new(h).lines());

        let pump = async {
            while stdout.is_some() || stderr.is_some() {
                tokio::select! {
                    line = next_line(&mut stdout), if stdout.is_some() => match line? {
                        Some(line) => output.output(&line),
                        None => stdout = None,
                    },
                    line = next_line(&mut stderr), if stderr.is_some() => match line? {
                        Some(line) => output.output(&line),
                        None => stderr = None,
                    },
                }
            }
            child
                .wait()
                .await
                .with_context(|| format!("waiting for {program}"))
        };

        let waited = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pump).await.ok(),
            None => Some(pump.await),
        };
        match waited {
            Some(status) => status,
            None => {
                let _ = child.kill().await;
                let limit = self.timeout.unwrap_or_default();
                anyhow::bail!("{program} timed out after {}s", limit.as_secs())
            }
        }
    }
}

async fn next_line<R>(lines: &mut Option<tokio::io::Lines<BufReader<R>>>) -> Result<Option<String>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await.context("reading command output"),
        None => Ok(None),
    }
}
