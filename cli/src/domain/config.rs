//! Domain types and validators for provisioner configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_INSTALLER_PATH: &str = "/usr/local/bin/dep";
pub const DEFAULT_INSTALLER_URL: &str = "http://deployer.org/deployer.phar";
pub const DEFAULT_DEPLOY_FILE: &str = "deploy.php";
pub const DEFAULT_TASK: &str = "deploy";
pub const DEFAULT_STAGING_DIRECTORY: &str = "/tmp/packer-deployer";

// ── Raw input ────────────────────────────────────────────────────────────────

/// Unresolved key/value input as supplied by the host build system.
///
/// Every field is optional; empty strings count as unset. The `packer_*`
/// keys are the common keys every Packer provisioner receives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawConfig {
    pub bin: Option<String>,
    pub url: Option<String>,
    pub file: Option<String>,
    pub task: Option<String>,
    pub staging_directory: Option<String>,
    pub skip_install: Option<bool>,
    pub before_install: Option<Vec<String>>,

    pub packer_build_name: Option<String>,
    pub packer_builder_type: Option<String>,
    pub packer_debug: Option<bool>,
    pub packer_force: Option<bool>,
    pub packer_on_error: Option<String>,
    pub packer_template_path: Option<String>,
    pub packer_user_variables: Option<BTreeMap<String, String>>,
}

impl RawConfig {
    /// Parse a YAML (or JSON) document into a raw layer.
    ///
    /// An empty document yields an empty layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` on malformed input or unknown keys.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Overlay `other` on top of `self`, key by key. Set values in `other` win.
    #[must_use]
    pub fn merge(self, other: RawConfig) -> RawConfig {
        RawConfig {
            bin: pick(self.bin, other.bin),
            url: pick(self.url, other.url),
            file: pick(self.file, other.file),
            task: pick(self.task, other.task),
            staging_directory: pick(self.staging_directory, other.staging_directory),
            skip_install: other.skip_install.or(self.skip_install),
            before_install: other.before_install.or(self.before_install),
            packer_build_name: pick(self.packer_build_name, other.packer_build_name),
            packer_builder_type: pick(self.packer_builder_type, other.packer_builder_type),
            packer_debug: other.packer_debug.or(self.packer_debug),
            packer_force: other.packer_force.or(self.packer_force),
            packer_on_error: pick(self.packer_on_error, other.packer_on_error),
            packer_template_path: pick(self.packer_template_path, other.packer_template_path),
            packer_user_variables: other.packer_user_variables.or(self.packer_user_variables),
        }
    }
}

fn pick(base: Option<String>, overlay: Option<String>) -> Option<String> {
    non_empty(overlay).or_else(|| non_empty(base))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// ── Resolved config ──────────────────────────────────────────────────────────

/// Build metadata handed over by the host. Only used for logging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub builder_type: Option<String>,
    pub debug: bool,
    pub force: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_variables: BTreeMap<String, String>,
}

/// Fully resolved provisioner configuration.
///
/// Built once by [`ProvisionConfig::resolve`]; every string field is
/// non-empty and `bin`/`staging_directory` are absolute remote paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionConfig {
    #[serde(rename = "bin")]
    installer_path: String,
    #[serde(rename = "url")]
    installer_url: String,
    before_install: Vec<String>,
    skip_install: bool,
    #[serde(rename = "file")]
    deploy_file: String,
    staging_directory: String,
    task: String,
    #[serde(skip_serializing_if = "is_default_build")]
    build: BuildInfo,
}

fn is_default_build(build: &BuildInfo) -> bool {
    *build == BuildInfo::default()
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            installer_path: DEFAULT_INSTALLER_PATH.to_string(),
            installer_url: DEFAULT_INSTALLER_URL.to_string(),
            before_install: Vec::new(),
            skip_install: false,
            deploy_file: DEFAULT_DEPLOY_FILE.to_string(),
            staging_directory: DEFAULT_STAGING_DIRECTORY.to_string(),
            task: DEFAULT_TASK.to_string(),
            build: BuildInfo::default(),
        }
    }
}

impl ProvisionConfig {
    /// Merge the raw layers (later wins), apply defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if a resolved value is malformed.
    pub fn resolve(layers: &[RawConfig]) -> Result<Self, ConfigError> {
        let raw = layers
            .iter()
            .cloned()
            .fold(RawConfig::default(), RawConfig::merge);

        let config = Self {
            installer_path: or_default(raw.bin, DEFAULT_INSTALLER_PATH),
            installer_url: or_default(raw.url, DEFAULT_INSTALLER_URL),
            before_install: raw
                .before_install
                .unwrap_or_default()
                .into_iter()
                .filter(|c| !c.trim().is_empty())
                .collect(),
            skip_install: raw.skip_install.unwrap_or(false),
            deploy_file: or_default(raw.file, DEFAULT_DEPLOY_FILE),
            staging_directory: or_default(raw.staging_directory, DEFAULT_STAGING_DIRECTORY),
            task: or_default(raw.task, DEFAULT_TASK),
            build: BuildInfo {
                build_name: non_empty(raw.packer_build_name),
                builder_type: non_empty(raw.packer_builder_type),
                debug: raw.packer_debug.unwrap_or(false),
                force: raw.packer_force.unwrap_or(false),
                on_error: non_empty(raw.packer_on_error),
                template_path: non_empty(raw.packer_template_path),
                user_variables: raw.packer_user_variables.unwrap_or_default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("bin", &self.installer_path),
            ("url", &self.installer_url),
            ("file", &self.deploy_file),
            ("staging_directory", &self.staging_directory),
            ("task", &self.task),
        ] {
            if value.contains(['\n', '\r', '\0']) {
                return Err(ConfigError::InvalidCharacter { key });
            }
        }
        if self.before_install.iter().any(|c| c.contains('\0')) {
            return Err(ConfigError::InvalidCharacter {
                key: "before_install",
            });
        }

        for (key, value) in [
            ("bin", &self.installer_path),
            ("staging_directory", &self.staging_directory),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::NotAbsolute {
                    key,
                    value: value.clone(),
                });
            }
        }

        if !has_scheme(&self.installer_url) {
            return Err(ConfigError::InvalidUrl(self.installer_url.clone()));
        }
        Ok(())
    }

    #[must_use]
    pub fn installer_path(&self) -> &str {
        &self.installer_path
    }

    #[must_use]
    pub fn installer_url(&self) -> &str {
        &self.installer_url
    }

    #[must_use]
    pub fn before_install(&self) -> &[String] {
        &self.before_install
    }

    #[must_use]
    pub fn skip_install(&self) -> bool {
        self.skip_install
    }

    #[must_use]
    pub fn deploy_file(&self) -> &str {
        &self.deploy_file
    }

    #[must_use]
    pub fn staging_directory(&self) -> &str {
        &self.staging_directory
    }

    #[must_use]
    pub fn task(&self) -> &str {
        &self.task
    }

    #[must_use]
    pub fn build(&self) -> &BuildInfo {
        &self.build
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    non_empty(value).unwrap_or_else(|| default.to_string())
}

/// `scheme://rest` where scheme is `[A-Za-z][A-Za-z0-9+.-]*` and rest is non-empty.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, rest)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
        && !rest.is_empty()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
