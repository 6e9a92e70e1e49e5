//! `deployer-provisioner config`: print the resolved configuration.
//!
//! Runs only the resolution step: no target is contacted.

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::commands::ConfigArgs;
use crate::output::OutputContext;
use crate::output::json::format_error;

/// Run the config command.
///
/// # Errors
///
/// Returns an error only if the output itself cannot be serialized.
pub fn run(ctx: &OutputContext, args: &ConfigArgs, json: bool) -> Result<ExitCode> {
    let config = match args.resolve() {
        Ok(config) => config,
        Err(err) => {
            let message = format!("{err:#}");
            if json {
                println!("{}", format_error(&message, "config")?);
            } else {
                ctx.error(&message);
            }
            return Ok(ExitCode::FAILURE);
        }
    };

    if json {
        let out = serde_json::to_string_pretty(&config).context("JSON serialization failed")?;
        println!("{out}");
    } else {
        let out = serde_yaml::to_string(&config).context("YAML serialization failed")?;
        print!("{out}");
    }
    Ok(ExitCode::SUCCESS)
}
