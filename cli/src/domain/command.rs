//! Remote command strings issued by the provisioning workflow.
//!
//! The remote surface is only "run a shell command" and
//! "upload a directory", so the exact strings built here are the contract
//! with the target machine.

use std::path::Path;

use crate::domain::config::ProvisionConfig;

/// Wrap `value` in single quotes for a POSIX shell.
fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Probe for the installer. Exit 0 when the path exists, 1 when it does not.
#[must_use]
pub fn probe_installer(installer_path: &str) -> String {
    format!("test -e {}", sh_quote(installer_path))
}

/// Fetch the installer from `url` into `installer_path`.
#[must_use]
pub fn download(url: &str, installer_path: &str) -> String {
    format!("curl -L {url} > {installer_path}")
}

/// Mark the downloaded installer executable.
#[must_use]
pub fn make_executable(installer_path: &str) -> String {
    format!("chmod +x {installer_path}")
}

/// Idempotent directory creation.
#[must_use]
pub fn create_directory(dir: &str) -> String {
    format!("mkdir -p {}", sh_quote(dir))
}

/// Run `task` with the installer from inside the staging directory.
#[must_use]
pub fn run_task(staging_directory: &str, installer_path: &str, task: &str) -> String {
    format!("cd {staging_directory} && {installer_path} {task}")
}

/// The full install sequence: `before_install` commands in order, then the
/// download, then the chmod.
#[must_use]
pub fn install_sequence(config: &ProvisionConfig) -> Vec<String> {
    config
        .before_install()
        .iter()
        .cloned()
        .chain([
            download(config.installer_url(), config.installer_path()),
            make_executable(config.installer_path()),
        ])
        .collect()
}

/// Local directory holding the deployment descriptor (`.` for a bare file name).
#[must_use]
pub fn project_dir(deploy_file: &str) -> String {
    match Path::new(deploy_file).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_string_lossy().into_owned(),
        _ => ".".to_string(),
    }
}

/// Ensure `source` ends with `/` so the directory's contents, not the
/// directory itself, land in the destination.
#[must_use]
pub fn with_trailing_separator(source: &str) -> String {
    if source.ends_with('/') {
        source.to_string()
    } else {
        format!("{source}/")
    }
}
