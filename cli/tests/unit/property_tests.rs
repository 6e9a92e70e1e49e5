//! Property-based tests for config resolution and the workflow's fail-fast
//! behaviour.

#![allow(clippy::expect_used)]

use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use deployer_provisioner::application::services::provision;
use deployer_provisioner::domain::command::{project_dir, with_trailing_separator};
use deployer_provisioner::domain::config::{ProvisionConfig, RawConfig};

use crate::mocks::{RecordingSession, SilentReporter};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
        .block_on(future)
}

// ============================================================================
// Upload source paths
// ============================================================================

proptest! {
    /// The upload source always ends with exactly one added separator.
    #[test]
    fn prop_trailing_separator_is_idempotent(source in "[a-z./]{0,24}") {
        let once = with_trailing_separator(&source);
        prop_assert!(once.ends_with('/'));
        prop_assert_eq!(with_trailing_separator(&once), once.clone());
        if !source.ends_with('/') {
            prop_assert_eq!(once, format!("{source}/"));
        }
    }

    /// The project directory of `<dir>/<file>` is `<dir>`.
    #[test]
    fn prop_project_dir_strips_file_name(
        dir in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        file in "[a-z]{1,8}\\.php",
    ) {
        prop_assert_eq!(project_dir(&format!("{dir}/{file}")), dir);
        prop_assert_eq!(project_dir(&file), ".");
    }
}

// ============================================================================
// Config resolution
// ============================================================================

fn optional_value() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[a-z]{1,12}".prop_map(Some),
    ]
}

proptest! {
    /// Whatever subset of keys is set (or set to blank), every resolved
    /// field is non-empty.
    #[test]
    fn prop_resolution_never_leaves_a_field_empty(
        file in optional_value(),
        task in optional_value(),
        bin in prop::option::of("/[a-z]{1,12}"),
    ) {
        let raw = RawConfig { file, task, bin, ..RawConfig::default() };
        let config = ProvisionConfig::resolve(&[raw]).expect("valid");
        prop_assert!(!config.installer_path().is_empty());
        prop_assert!(!config.installer_url().is_empty());
        prop_assert!(!config.deploy_file().is_empty());
        prop_assert!(!config.staging_directory().is_empty());
        prop_assert!(!config.task().is_empty());
    }

    /// A non-empty value in a later layer always wins over an earlier one.
    #[test]
    fn prop_later_layer_wins(first in "[a-z]{1,12}", second in optional_value()) {
        let base = RawConfig { task: Some(first.clone()), ..RawConfig::default() };
        let over = RawConfig { task: second.clone(), ..RawConfig::default() };
        let config = ProvisionConfig::resolve(&[base, over]).expect("valid");
        let expected = second.filter(|s| !s.is_empty()).unwrap_or(first);
        prop_assert_eq!(config.task(), expected.as_str());
    }
}

// ============================================================================
// Fail-fast install
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// When install command `k` fails, exactly the probe and commands
    /// `0..=k` were issued and nothing after them.
    #[test]
    fn prop_install_halts_at_first_failure(
        (count, fail_at) in (1usize..6).prop_flat_map(|n| (Just(n), 0..n)),
        status in 1i32..255,
    ) {
        let commands: Vec<String> = (0..count).map(|i| format!("step-{i}")).collect();
        let config = ProvisionConfig::resolve(&[RawConfig {
            before_install: Some(commands.clone()),
            ..RawConfig::default()
        }])
        .expect("valid");
        let probe = "test -e '/usr/local/bin/dep'";
        let session = RecordingSession::new()
            .with_status(probe, 1)
            .with_status(&commands[fail_at], status);

        let result = block_on(provision(
            &config,
            &session,
            &SilentReporter,
            &CancellationToken::new(),
        ));

        prop_assert!(result.is_err());
        let mut expected = vec![probe.to_string()];
        expected.extend(commands[..=fail_at].iter().cloned());
        prop_assert_eq!(session.executed(), expected);
    }
}
