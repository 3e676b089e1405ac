//! Remove untracked archives

use anyhow::Result;
use cellar_core::{Catalog, Config};
use cellar_snapshot::clean_untracked;
use owo_colors::OwoColorize;

pub async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let catalog = Catalog::load(config).await;
    let outcome = clean_untracked(config, &catalog, dry_run).await?;

    if outcome.removed.is_empty() {
        println!("{}", "No untracked archives".dimmed());
        return Ok(());
    }

    let verb = if dry_run { "Would remove" } else { "Removed" };
    for name in &outcome.removed {
        println!("{} {}", verb.red(), name);
    }
    println!(
        "{} {} untracked, kept {}",
        verb,
        outcome.removed.len(),
        outcome.kept
    );

    Ok(())
}
