//! Typed domain error enums.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Workflow steps ────────────────────────────────────────────────────────────

/// The workflow step an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    InstallCheck,
    Install,
    CreateDirectory,
    Upload,
    Execute,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstallCheck => "install check",
            Self::Install => "install",
            Self::CreateDirectory => "create directory",
            Self::Upload => "upload",
            Self::Execute => "execute",
        };
        f.write_str(name)
    }
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Malformed or unresolvable provisioner input. Raised before any remote call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot parse configuration: {0}")]
    Parse(String),

    #[error("{key} must be an absolute path (got: {value})")]
    NotAbsolute { key: &'static str, value: String },

    #[error("url must include a scheme such as http:// (got: {0})")]
    InvalidUrl(String),

    #[error("{key} must not contain newline or NUL characters")]
    InvalidCharacter { key: &'static str },
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Terminal failure of a provisioning run.
///
/// Transport failures and non-zero exit statuses are kept apart so the
/// caller can tell a dropped connection from a failing remote command.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("transport failure during {step}: {source:#}")]
    Transport {
        step: Step,
        source: anyhow::Error,
    },

    #[error("Command '{command}' exited with non-zero exit status {status}")]
    CommandFailed {
        step: Step,
        command: String,
        status: i32,
    },

    #[error("uploading {source_dir} to {destination} failed: {source:#}")]
    Upload {
        source_dir: String,
        destination: String,
        source: anyhow::Error,
    },
}

impl ProvisionError {
    /// Stable machine-readable code used by `--json` output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Transport { .. } => "transport",
            Self::CommandFailed { .. } => "command_failed",
            Self::Upload { .. } => "upload",
        }
    }

    /// The step the failure happened in, if it happened inside the workflow.
    #[must_use]
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::Config(_) => None,
            Self::Transport { step, .. } | Self::CommandFailed { step, .. } => Some(*step),
            Self::Upload { .. } => Some(Step::Upload),
        }
    }
}
