//! Configuration inspection.

use anyhow::{Context, Result};

use crate::GlobalArgs;

/// Prints the merged configuration.
pub fn show(global: &GlobalArgs, json: bool) -> Result<()> {
    let config = super::load_config(global)?;

    if json {
        let rendered =
            serde_json::to_string_pretty(&config).context("Failed to render configuration")?;
        println!("{rendered}");
    } else {
        let rendered = config
            .to_toml_string()
            .context("Failed to render configuration")?;
        print!("{rendered}");
    }
    Ok(())
}
