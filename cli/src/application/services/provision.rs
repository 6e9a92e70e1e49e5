//! Application service: the provisioning workflow.
//!
//! install check → (optional) install → upload project → execute task.
//! Every step is awaited before the next one starts and the first failure
//! ends the run. Nothing is rolled back: a retried run relies on the
//! commands themselves being idempotent (`mkdir -p`, re-upload, re-run).
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::ports::{ProgressReporter, RemoteCommandResult, RemoteSession};
use crate::domain::command;
use crate::domain::config::ProvisionConfig;
use crate::domain::error::{ProvisionError, Step};

/// Terminal result of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// All steps ran and every remote command exited 0.
    Completed,
    /// Cancellation was observed; no further remote calls were made.
    Cancelled,
}

/// Reported once when a run stops on cancellation.
pub const CANCELLED_WARNING: &str =
    "provisioning cancelled; commands already started on the target may still be running";

/// Run the full provisioning workflow against `session`.
///
/// `cancel` is checked before every remote call and raced against the call
/// in flight. Once it fires the workflow stops issuing commands and returns
/// [`ProvisionOutcome::Cancelled`] after warning through `reporter`;
/// whatever was already dispatched to the target may keep running there.
///
/// # Errors
///
/// Returns the first failure: a transport error from the session, a remote
/// command with a non-zero exit status, or a failed upload.
pub async fn provision(
    config: &ProvisionConfig,
    session: &impl RemoteSession,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
) -> Result<ProvisionOutcome, ProvisionError> {
    let build = config.build();
    info!(
        build_name = build.build_name.as_deref().unwrap_or("-"),
        builder_type = build.builder_type.as_deref().unwrap_or("-"),
        task = config.task(),
        staging_directory = config.staging_directory(),
        "starting deployer provisioning"
    );

    let workflow = Workflow {
        config,
        session,
        reporter,
        cancel,
    };
    match workflow.steps().await {
        Ok(()) => {
            info!("deployer provisioning completed");
            Ok(ProvisionOutcome::Completed)
        }
        Err(Halt::Cancelled) => {
            warn!("deployer provisioning cancelled");
            reporter.warn(CANCELLED_WARNING);
            Ok(ProvisionOutcome::Cancelled)
        }
        Err(Halt::Failed(err)) => {
            warn!(error = %err, step = ?err.step(), "deployer provisioning failed");
            Err(err)
        }
    }
}

/// Why the step chain stopped early.
enum Halt {
    Cancelled,
    Failed(ProvisionError),
}

impl From<ProvisionError> for Halt {
    fn from(err: ProvisionError) -> Self {
        Self::Failed(err)
    }
}

type Flow<T = ()> = Result<T, Halt>;

struct Workflow<'a, S> {
    config: &'a ProvisionConfig,
    session: &'a S,
    reporter: &'a dyn ProgressReporter,
    cancel: &'a CancellationToken,
}

impl<S: RemoteSession> Workflow<'_, S> {
    async fn steps(&self) -> Flow {
        self.ensure_installed().await?;
        self.upload_project().await?;
        self.execute_task().await
    }

    // ── Step 1: install check ────────────────────────────────────────────────

    async fn ensure_installed(&self) -> Flow {
        if self.config.skip_install() {
            debug!("skip_install set, not checking for installer");
            return Ok(());
        }
        if self.installer_present().await? {
            debug!(path = self.config.installer_path(), "installer already present");
            return Ok(());
        }
        self.install().await
    }

    async fn installer_present(&self) -> Flow<bool> {
        let probe = command::probe_installer(self.config.installer_path());
        let result = self.execute(Step::InstallCheck, &probe).await?;
        match result.exit_status {
            0 => Ok(true),
            1 => Ok(false),
            status => Err(ProvisionError::CommandFailed {
                step: Step::InstallCheck,
                command: probe,
                status,
            }
            .into()),
        }
    }

    async fn install(&self) -> Flow {
        self.reporter.step("Installing deployer...");
        for cmd in command::install_sequence(self.config) {
            self.run_checked(Step::Install, &cmd).await?;
        }
        info!(path = self.config.installer_path(), "installer downloaded");
        Ok(())
    }

    // ── Step 2: upload project ───────────────────────────────────────────────

    async fn upload_project(&self) -> Flow {
        self.reporter.step("Provisioning with deployer");
        let source = command::project_dir(self.config.deploy_file());
        self.upload_directory(self.config.staging_directory(), &source)
            .await
    }

    async fn upload_directory(&self, destination: &str, source: &str) -> Flow {
        self.create_dir(destination).await?;

        let source = command::with_trailing_separator(source);
        self.check_cancelled()?;
        debug!(source = %source, destination, "uploading project directory");
        let uploaded = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Halt::Cancelled),
            result = self.session.upload_dir(destination, &source) => result,
        };
        uploaded.map_err(|err| ProvisionError::Upload {
            source_dir: source,
            destination: destination.to_string(),
            source: err,
        })?;
        Ok(())
    }

    async fn create_dir(&self, dir: &str) -> Flow {
        self.reporter.step(&format!("Creating directory: {dir}"));
        self.run_checked(Step::CreateDirectory, &command::create_directory(dir))
            .await
    }

    // ── Step 3: execute task ─────────────────────────────────────────────────

    async fn execute_task(&self) -> Flow {
        let cmd = command::run_task(
            self.config.staging_directory(),
            self.config.installer_path(),
            self.config.task(),
        );
        self.run_checked(Step::Execute, &cmd).await?;
        self.reporter
            .success(&format!("task '{}' completed", self.config.task()));
        Ok(())
    }

    // ── Remote calls ─────────────────────────────────────────────────────────

    /// Execute `cmd` and turn a non-zero exit status into `CommandFailed`.
    async fn run_checked(&self, step: Step, cmd: &str) -> Flow {
        let result = self.execute(step, cmd).await?;
        if result.success() {
            return Ok(());
        }
        Err(ProvisionError::CommandFailed {
            step,
            command: cmd.to_string(),
            status: result.exit_status,
        }
        .into())
    }

    async fn execute(&self, step: Step, cmd: &str) -> Flow<RemoteCommandResult> {
        self.check_cancelled()?;
        debug!(%step, command = cmd, "running remote command");
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(Halt::Cancelled),
            result = self.session.execute(cmd, self.reporter) => result,
        };
        let result = result.map_err(|source| ProvisionError::Transport { step, source })?;
        debug!(%step, status = result.exit_status, "remote command finished");
        Ok(result)
    }

    fn check_cancelled(&self) -> Flow {
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }
        Ok(())
    }
}
