//! `deployer-provisioner provision`: run the provisioning workflow.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgGroup, Args};
use tokio_util::sync::CancellationToken;

use crate::application::services::{ProvisionOutcome, provision};
use crate::commands::ConfigArgs;
use crate::infra::local::LocalSession;
use crate::infra::ssh::{SshSession, SshTarget};
use crate::output::json::{format_error, format_status};
use crate::output::{OutputContext, TerminalReporter};

/// Arguments for the provision command.
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["host", "local"])))]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Host to provision over SSH
    #[arg(long)]
    pub host: Option<String>,

    /// SSH user
    #[arg(long, short = 'u', requires = "host", conflicts_with = "local")]
    pub user: Option<String>,

    /// SSH port
    #[arg(long, short = 'p', requires = "host", conflicts_with = "local")]
    pub port: Option<u16>,

    /// SSH private key
    #[arg(long, short = 'i', requires = "host", conflicts_with = "local")]
    pub identity_file: Option<PathBuf>,

    /// Extra SSH option (repeatable)
    #[arg(
        long = "ssh-option",
        short = 'o',
        value_name = "KEY=VALUE",
        requires = "host",
        conflicts_with = "local"
    )]
    pub ssh_options: Vec<String>,

    /// Provision this machine instead of a remote host
    #[arg(long)]
    pub local: bool,

    /// Per-command timeout in seconds (none by default)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl ProvisionArgs {
    fn ssh_target(&self, host: &str) -> SshTarget {
        SshTarget {
            host: host.to_string(),
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity_file.clone(),
            options: self.ssh_options.clone(),
        }
    }
}

/// Run the provision command.
///
/// Failures are rendered here (human or JSON) and turned into a failing
/// exit code. Cancellation exits successfully; the workflow has already
/// warned through the reporter.
///
/// # Errors
///
/// Returns an error only if the JSON output cannot be serialized.
pub async fn run(
    ctx: &OutputContext,
    args: &ProvisionArgs,
    json: bool,
    cancel: &CancellationToken,
) -> Result<ExitCode> {
    let config = match args.config.resolve() {
        Ok(config) => config,
        Err(err) => return report_failure(ctx, json, &format!("{err:#}"), "config"),
    };

    let reporter = if json {
        TerminalReporter::stderr(ctx)
    } else {
        TerminalReporter::new(ctx)
    };
    let timeout = args.timeout.map(Duration::from_secs);

    let outcome = match &args.host {
        Some(host) => {
            let session = SshSession::with_tokio_runner(args.ssh_target(host), timeout);
            provision(&config, &session, &reporter, cancel).await
        }
        None => {
            let session = LocalSession::with_tokio_runner(timeout);
            provision(&config, &session, &reporter, cancel).await
        }
    };

    match outcome {
        Ok(ProvisionOutcome::Completed) => {
            if json {
                println!("{}", format_status("completed")?);
            } else {
                ctx.success("provisioning complete");
            }
            Ok(ExitCode::SUCCESS)
        }
        Ok(ProvisionOutcome::Cancelled) => {
            if json {
                println!("{}", format_status("cancelled")?);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => report_failure(ctx, json, &err.to_string(), err.code()),
    }
}

fn report_failure(ctx: &OutputContext, json: bool, message: &str, code: &str) -> Result<ExitCode> {
    if json {
        println!("{}", format_error(message, code)?);
    } else {
        ctx.error(message);
    }
    Ok(ExitCode::FAILURE)
}
