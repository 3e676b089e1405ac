//! Verify archives

use crate::util;
use anyhow::{bail, Result};
use cellar_core::{resolve, Catalog, Config};
use cellar_snapshot::{Verification, Verifier};
use owo_colors::OwoColorize;

pub async fn run(config: &Config, reference: Option<&str>, json: bool) -> Result<()> {
    // 1. Pick the archives to check
    let catalog = Catalog::load(config).await;

    let entries = match reference {
        Some(reference) => std::slice::from_ref(resolve(reference, &catalog)?),
        None => catalog.entries(),
    };

    if entries.is_empty() {
        bail!("No archives to verify in {}", config.archive_dir.display());
    }

    // 2. Check every one, even after a failure
    let report = Verifier::new(config).verify_all(entries).await;

    // 3. Report, then fail if anything was invalid
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            print_result(result);
        }
        println!();
    }

    if !report.all_valid() {
        bail!(
            "{} of {} archives failed verification",
            report.failed_count(),
            report.results.len()
        );
    }

    if !json {
        println!("{} {} archives verified", "✓".green(), report.results.len());
    }
    Ok(())
}

fn print_result(result: &Verification) {
    if result.valid {
        println!("{} {}  {}", "✓".green(), result.archive, result.detail.dimmed());
    } else {
        println!("{} {}  {}", "✗".red(), result.archive, result.detail.red());
    }

    if let Some(commit) = &result.commit {
        println!(
            "    {} {} {} {}",
            commit.short_hash.yellow(),
            commit.author,
            util::format_relative_time(util::unix_secs_to_ms(commit.timestamp)).dimmed(),
            commit.subject
        );
    }

    for warning in &result.warnings {
        println!("    {} {}", "⚠".yellow(), warning.dimmed());
    }
}
