//! `playtest config`: print the effective configuration.

use anyhow::{Context, Result};

use crate::domain::models::Config;

pub fn execute(config: &Config, json_mode: bool) -> Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
        print!("{yaml}");
    }
    Ok(())
}
