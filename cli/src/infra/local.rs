//! Local session: runs "remote" commands on this machine.
//!
//! Useful for provisioning the machine the build already runs on (chroot
//! and container builders) and for end-to-end testing of the workflow.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, DirectoryUploader, ProgressReporter, RemoteCommandResult, RemoteExecutor,
};
use crate::infra::command_runner::TokioCommandRunner;

/// Session whose commands run through `sh -c` and whose uploads are
/// filesystem copies.
pub struct LocalSession<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> LocalSession<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl LocalSession<TokioCommandRunner> {
    #[must_use]
    pub fn with_tokio_runner(timeout: Option<std::time::Duration>) -> Self {
        Self::new(TokioCommandRunner::new(timeout))
    }
}

impl<R: CommandRunner> RemoteExecutor for LocalSession<R> {
    async fn execute(
        &self,
        command: &str,
        output: &dyn ProgressReporter,
    ) -> Result<RemoteCommandResult> {
        let status = self
            .runner
            .run_streaming("sh", &["-c", command], output)
            .await
            .context("sh -c")?;
        let code = status
            .code()
            .ok_or_else(|| anyhow::anyhow!("sh was terminated by a signal"))?;
        Ok(RemoteCommandResult::new(code))
    }
}

impl<R: CommandRunner> DirectoryUploader for LocalSession<R> {
    async fn upload_dir(&self, destination: &str, source: &str) -> Result<()> {
        let src = Path::new(source).to_path_buf();
        let mut dst = Path::new(destination).to_path_buf();
        if !source.ends_with('/') {
            let name = src
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("cannot determine directory name of {source}"))?;
            dst.push(name);
        }
        tokio::task::spawn_blocking(move || {
            ensure_outside_source(&src, &dst)?;
            copy_tree(&src, &dst)
        })
        .await
        .context("spawn_blocking for upload_dir")?
    }
}

/// Refuse a destination inside the source tree; the copy would recurse
/// into its own output.
fn ensure_outside_source(src: &Path, dst: &Path) -> Result<()> {
    let src = std::fs::canonicalize(src)
        .with_context(|| format!("reading directory {}", src.display()))?;
    std::fs::create_dir_all(dst).with_context(|| format!("creating directory {}", dst.display()))?;
    let dst = std::fs::canonicalize(dst)
        .with_context(|| format!("resolving directory {}", dst.display()))?;
    if dst.starts_with(&src) {
        anyhow::bail!(
            "destination {} lies inside the uploaded directory {}",
            dst.display(),
            src.display()
        );
    }
    Ok(())
}

/// Recursively copy the contents of `src` into `dst`, creating `dst`.
///
/// Symlinks are recreated as links, dangling or not, the way `rsync -a`
/// transfers them.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst).with_context(|| format!("creating directory {}", dst.display()))?;
    let entries =
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading directory {}", src.display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading file type of {}", from.display()))?;
        if file_type.is_symlink() {
            copy_symlink(&from, &to)?;
        } else if file_type.is_dir() {
            copy_tree(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)
                .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target =
        std::fs::read_link(from).with_context(|| format!("reading link {}", from.display()))?;
    // Re-uploads replace the previous link.
    if std::fs::symlink_metadata(to).is_ok_and(|meta| meta.file_type().is_symlink()) {
        std::fs::remove_file(to).with_context(|| format!("removing link {}", to.display()))?;
    }
    std::os::unix::fs::symlink(&target, to)
        .with_context(|| format!("linking {} to {}", to.display(), target.display()))
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, _to: &Path) -> Result<()> {
    anyhow::bail!("cannot upload symlink {} on this platform", from.display())
}
