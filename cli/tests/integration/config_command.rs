//! Integration tests for `deployer-provisioner config`.
//!
//! Config files live in temp directories; `DEPLOYER_PROVISIONER_CONFIG` is
//! cleared so the host environment never leaks in.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn provisioner() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deployer-provisioner"));
    cmd.env("NO_COLOR", "1")
        .env_remove("DEPLOYER_PROVISIONER_CONFIG");
    cmd
}

/// Write `content` to a config file inside a fresh temp dir.
fn config_file(name: &str, content: &str) -> (TempDir, String) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write config");
    (dir, path.to_string_lossy().into_owned())
}

fn config_json(args: &[&str]) -> serde_json::Value {
    let output = provisioner()
        .arg("config")
        .args(args)
        .arg("--json")
        .output()
        .expect("run");
    assert!(output.status.success(), "config failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("config --json prints JSON")
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[test]
fn test_config_without_input_prints_defaults_as_yaml() {
    provisioner()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("bin: /usr/local/bin/dep"))
        .stdout(predicate::str::contains("file: deploy.php"))
        .stdout(predicate::str::contains("staging_directory: /tmp/packer-deployer"))
        .stdout(predicate::str::contains("task: deploy"))
        .stdout(predicate::str::contains("skip_install: false"));
}

#[test]
fn test_config_json_has_all_keys() {
    let value = config_json(&[]);
    assert_eq!(value["bin"], "/usr/local/bin/dep");
    assert_eq!(value["url"], "http://deployer.org/deployer.phar");
    assert_eq!(value["file"], "deploy.php");
    assert_eq!(value["staging_directory"], "/tmp/packer-deployer");
    assert_eq!(value["task"], "deploy");
    assert_eq!(value["skip_install"], false);
    assert_eq!(value["before_install"], serde_json::json!([]));
}

// ---------------------------------------------------------------------------
// Layering
// ---------------------------------------------------------------------------

#[test]
fn test_flags_override_config_file() {
    let (_dir, path) = config_file(
        "deployer.yaml",
        "task: release\nstaging_directory: /srv/stage\nbefore_install:\n  - apt-get update\n",
    );

    let value = config_json(&["--config", &path, "--task", "ship"]);

    assert_eq!(value["task"], "ship");
    assert_eq!(value["staging_directory"], "/srv/stage");
    assert_eq!(value["before_install"], serde_json::json!(["apt-get update"]));
}

#[test]
fn test_config_file_from_environment() {
    let (_dir, path) = config_file("deployer.json", r#"{"bin": "/opt/dep", "skip_install": true}"#);

    let output = provisioner()
        .args(["config", "--json"])
        .env("DEPLOYER_PROVISIONER_CONFIG", &path)
        .output()
        .expect("run");

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["bin"], "/opt/dep");
    assert_eq!(value["skip_install"], true);
}

#[test]
fn test_before_install_flags_replace_file_list() {
    let (_dir, path) = config_file("deployer.yaml", "before_install: [one, two]\n");

    let value = config_json(&[
        "--config",
        &path,
        "--before-install",
        "three",
        "--before-install",
        "four",
    ]);

    assert_eq!(value["before_install"], serde_json::json!(["three", "four"]));
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

#[test]
fn test_relative_staging_directory_is_rejected() {
    provisioner()
        .args(["config", "--staging-directory", "stage"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "staging_directory must be an absolute path",
        ));
}

#[test]
fn test_url_without_scheme_is_rejected_as_json() {
    let output = provisioner()
        .args(["config", "--json", "--url", "deployer.org/deployer.phar"])
        .output()
        .expect("run");

    assert_eq!(output.status.code(), Some(1));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json error");
    assert_eq!(value["error"], true);
    assert_eq!(value["code"], "config");
}

#[test]
fn test_unknown_key_in_config_file_is_rejected() {
    let (_dir, path) = config_file("deployer.yaml", "tasks: deploy\n");

    provisioner()
        .args(["config", "--config", &path])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot parse"));
}

#[test]
fn test_missing_config_file_is_rejected() {
    provisioner()
        .args(["config", "--config", "/definitely/not/here.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/definitely/not/here.yaml"));
}
