//! Loads a raw configuration layer from a YAML or JSON file on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::config::RawConfig;

/// A provisioner config file. JSON documents are accepted since JSON is YAML.
pub struct YamlConfigFile {
    path: PathBuf,
}

impl YamlConfigFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and parse the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid layer.
    pub fn load(&self) -> Result<RawConfig> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("cannot read {}", self.path.display()))?;
        RawConfig::from_yaml_str(&content)
            .with_context(|| format!("cannot parse {}", self.path.display()))
    }
}
