//! SSH session: `RemoteExecutor` via `ssh`, `DirectoryUploader` via `rsync`.
//!
//! All process execution is routed through a `CommandRunner` so tests can
//! inject a mock runner without spawning real processes.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::application::ports::{
    CommandRunner, DirectoryUploader, ProgressReporter, RemoteCommandResult, RemoteExecutor,
};
use crate::infra::command_runner::TokioCommandRunner;

/// Exit status `ssh` itself uses for connection and authentication errors.
pub const SSH_TRANSPORT_FAILURE: i32 = 255;

/// Where and how to connect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    /// Extra `-o Key=Value` options.
    pub options: Vec<String>,
}

impl SshTarget {
    /// `user@host`, or just `host` when no user is configured.
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// Connection options shared by `ssh` and the `rsync -e` transport.
    ///
    /// `BatchMode=yes` makes a missing key fail fast instead of prompting.
    #[must_use]
    pub fn ssh_options(&self) -> Vec<String> {
        let mut args = vec!["-o".to_string(), "BatchMode=yes".to_string()];
        if let Some(port) = self.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        if let Some(identity) = &self.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        for option in &self.options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args
    }

    /// The `rsync -e` transport string, e.g. `ssh -o BatchMode=yes -p 2222`.
    #[must_use]
    pub fn rsync_shell(&self) -> String {
        std::iter::once("ssh".to_string())
            .chain(self.ssh_options().iter().map(|arg| rsync_quote(arg)))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// rsync splits `-e` on whitespace but honours single quotes.
fn rsync_quote(arg: &str) -> String {
    if arg.contains(char::is_whitespace) {
        format!("'{arg}'")
    } else {
        arg.to_string()
    }
}

/// Remote session over a single SSH target.
pub struct SshSession<R: CommandRunner> {
    target: SshTarget,
    runner: R,
}

impl<R: CommandRunner> SshSession<R> {
    /// Create a session with an explicit runner.
    pub fn new(target: SshTarget, runner: R) -> Self {
        Self { target, runner }
    }
}

impl SshSession<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn with_tokio_runner(target: SshTarget, timeout: Option<std::time::Duration>) -> Self {
        Self::new(target, TokioCommandRunner::new(timeout))
    }
}

impl<R: CommandRunner> RemoteExecutor for SshSession<R> {
    async fn execute(
        &self,
        command: &str,
        output: &dyn ProgressReporter,
    ) -> Result<RemoteCommandResult> {
        let destination = self.target.destination();
        let mut args = self.target.ssh_options();
        args.push(destination.clone());
        args.push("--".to_string());
        args.push(command.to_string());
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let status = self
            .runner
            .run_streaming("ssh", &args, output)
            .await
            .context("ssh exec")?;
        debug!(host = %destination, ?status, "ssh command finished");
        match status.code() {
            // ssh cannot tell its own failure apart from a remote command
            // that exited 255, so both surface as a transport error.
            Some(SSH_TRANSPORT_FAILURE) => anyhow::bail!(
                "ssh to {destination} exited with status {SSH_TRANSPORT_FAILURE} while running \
                 '{command}': the connection failed or the remote command itself exited \
                 {SSH_TRANSPORT_FAILURE}"
            ),
            Some(code) => Ok(RemoteCommandResult::new(code)),
            None => anyhow::bail!("ssh to {destination} was terminated by a signal"),
        }
    }
}

impl<R: CommandRunner> DirectoryUploader for SshSession<R> {
    async fn upload_dir(&self, destination: &str, source: &str) -> Result<()> {
        let shell = self.target.rsync_shell();
        let remote = format!("{}:{destination}", self.target.destination());
        let out = self
            .runner
            .run("rsync", &["-a", "-e", &shell, source, &remote])
            .await
            .context("rsync")?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            anyhow::bail!(
                "rsync exited with {}: {}",
                out.status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
                stderr.trim()
            );
        }
        Ok(())
    }
}
