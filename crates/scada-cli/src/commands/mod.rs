//! CLI command implementations.

pub mod config;
pub mod run;
pub mod scenarios;
pub mod sweep;
pub mod version;

use anyhow::{Context, Result};
use scada_config::{ConfigLoader, ScadaConfig};

use crate::GlobalArgs;

/// Loads the merged configuration for the selected project.
pub fn load_config(global: &GlobalArgs) -> Result<ScadaConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(dir) = &global.project_dir {
        loader = loader.with_project_dir(dir);
    }
    if let Some(file) = &global.config {
        loader = loader.with_config_file(file);
    }
    let config = loader.load().context("Failed to load configuration")?;

    if !config.output.color {
        crate::style::set_no_color(true);
    }
    Ok(config)
}
