//! Command implementations

pub mod config;
pub mod provision;
pub mod version;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::domain::config::{ProvisionConfig, RawConfig};
use crate::infra::config::YamlConfigFile;

/// Configuration sources shared by `provision` and `config`.
///
/// Layers are applied in order: the config file, then the flags given here.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// Provisioner config file (YAML or JSON)
    #[arg(long, short = 'c', env = "DEPLOYER_PROVISIONER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Remote path of the deployer binary [default: /usr/local/bin/dep]
    #[arg(long)]
    pub bin: Option<String>,

    /// Download URL of the deployer binary [default: http://deployer.org/deployer.phar]
    #[arg(long)]
    pub url: Option<String>,

    /// Local deployment descriptor; its directory is uploaded [default: deploy.php]
    #[arg(long)]
    pub file: Option<String>,

    /// Task passed to the deployer binary [default: deploy]
    #[arg(long)]
    pub task: Option<String>,

    /// Remote directory receiving the project [default: /tmp/packer-deployer]
    #[arg(long)]
    pub staging_directory: Option<String>,

    /// Never attempt to install the deployer binary
    #[arg(long)]
    pub skip_install: bool,

    /// Shell command to run before the download (repeatable, runs in order)
    #[arg(long = "before-install", value_name = "COMMAND")]
    pub before_install: Vec<String>,
}

impl ConfigArgs {
    /// The raw layers in application order.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn layers(&self) -> Result<Vec<RawConfig>> {
        let mut layers = Vec::with_capacity(2);
        if let Some(path) = &self.config {
            layers.push(YamlConfigFile::new(path).load()?);
        }
        layers.push(self.flag_layer());
        Ok(layers)
    }

    /// Resolve all layers into the final configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be loaded or the result is invalid.
    pub fn resolve(&self) -> Result<ProvisionConfig> {
        Ok(ProvisionConfig::resolve(&self.layers()?)?)
    }

    fn flag_layer(&self) -> RawConfig {
        RawConfig {
            bin: self.bin.clone(),
            url: self.url.clone(),
            file: self.file.clone(),
            task: self.task.clone(),
            staging_directory: self.staging_directory.clone(),
            // An absent flag must not override `skip_install: true` from the file.
            skip_install: self.skip_install.then_some(true),
            before_install: (!self.before_install.is_empty()).then(|| self.before_install.clone()),
            ..RawConfig::default()
        }
    }
}
