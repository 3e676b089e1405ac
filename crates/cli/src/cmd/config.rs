//! Show the effective configuration

use anyhow::{Context, Result};
use cellar_core::Config;

pub fn run(config: &Config) -> Result<()> {
    let rendered = toml::to_string_pretty(&config.to_file()).context("Failed to render configuration")?;
    println!("# root = {}", config.root.display());
    print!("{}", rendered);
    Ok(())
}
