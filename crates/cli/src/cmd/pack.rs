//! Snapshot the private directory

use crate::util;
use anyhow::Result;
use cellar_core::Config;
use cellar_snapshot::Packer;
use owo_colors::OwoColorize;

pub async fn run(config: &Config, force: bool) -> Result<()> {
    let outcome = Packer::new(config).pack(force).await?;

    println!(
        "{} Created {} ({})",
        "✓".green(),
        outcome.archive.yellow(),
        util::format_size(outcome.size_bytes)
    );

    if outcome.staged {
        println!("{}", "Staged for commit; run `git commit` to record it".dimmed());
    } else {
        println!("{}", "Not staged: archive directory is outside a git work tree".dimmed());
    }

    Ok(())
}
