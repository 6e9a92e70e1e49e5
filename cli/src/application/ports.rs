//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::{ExitStatus, Output};
use std::time::Duration;

use anyhow::Result;

// ── Value Types ───────────────────────────────────────────────────────────────

/// Result of one remote command invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteCommandResult {
    pub exit_status: i32,
}

impl RemoteCommandResult {
    #[must_use]
    pub fn new(exit_status: i32) -> Self {
        Self { exit_status }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

// ── Remote Session Ports ──────────────────────────────────────────────────────

/// Command execution on the remote target.
#[allow(async_fn_in_trait)]
pub trait RemoteExecutor {
    /// Run `command` through the remote shell and wait for it to finish.
    ///
    /// Remote stdout/stderr lines are streamed to `output` as they arrive.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures (connection lost, spawn
    /// failure, timeout). A command that ran and failed is `Ok` with a
    /// non-zero `exit_status`.
    async fn execute(
        &self,
        command: &str,
        output: &dyn ProgressReporter,
    ) -> Result<RemoteCommandResult>;
}

/// Recursive directory upload to the remote target.
#[allow(async_fn_in_trait)]
pub trait DirectoryUploader {
    /// Upload `source` into `destination`, preserving relative paths.
    ///
    /// `destination` must already exist. A `source` ending in `/` uploads the
    /// directory's contents; otherwise the directory itself is nested.
    async fn upload_dir(&self, destination: &str, source: &str) -> Result<()>;
}

/// Composite trait: one established connection offering both capabilities.
pub trait RemoteSession: RemoteExecutor + DirectoryUploader {}

/// Blanket implementation: any type implementing both sub-traits is a `RemoteSession`.
impl<T> RemoteSession for T where T: RemoteExecutor + DirectoryUploader {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so session adapters can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout, if any.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program, forwarding each stdout/stderr line to `output`, and
    /// return its exit status.
    async fn run_streaming(
        &self,
        program: &str,
        args: &[&str],
        output: &dyn ProgressReporter,
    ) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Relay one line of output produced by a remote command.
    fn output(&self, line: &str);
}
