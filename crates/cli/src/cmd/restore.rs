//! Restore the private directory from an archive

use crate::util;
use anyhow::Result;
use cellar_core::{resolve, Catalog, Config};
use cellar_snapshot::Restorer;
use owo_colors::OwoColorize;

pub async fn run(config: &Config, reference: Option<&str>, json: bool, yes: bool) -> Result<()> {
    // 1. Resolve the archive
    let catalog = Catalog::load(config).await;

    let entry = match reference {
        Some(reference) => resolve(reference, &catalog)?,
        None => Restorer::default_entry(&catalog)?,
    };

    // 2. Confirm with user
    if !yes {
        eprintln!("{}", "Restore Archive".bold());
        eprintln!("Archive: {}", entry.name.yellow());
        if let Some(p) = &entry.provenance {
            eprintln!("Commit:  {} {}", entry.short_hash().unwrap_or_default(), p.message.dimmed());
        }
        eprintln!(
            "{}",
            format!(
                "This replaces everything in {}",
                config.private_dir.display()
            )
            .red()
            .bold()
        );

        if !util::confirm("Continue?")? {
            eprintln!("{}", "Restore cancelled".yellow());
            return Ok(());
        }
    }

    // 3. Restore
    let outcome = Restorer::new(config).restore(entry).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!(
            "{} Restored {} files from {} into {}",
            "✓".green(),
            outcome.files.to_string().green(),
            outcome.archive,
            outcome.restored_to.display()
        );
    }

    Ok(())
}
