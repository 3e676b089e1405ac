//! List archives or the files inside one

use crate::util;
use anyhow::Result;
use cellar_core::{resolve, ArchiveEntry, Catalog, Config, Provenance};
use cellar_snapshot::{ops, FileMetadata, SnapshotPipeline};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

/// One catalog row in `--json` output
#[derive(Serialize)]
struct ArchiveRow<'a> {
    index: usize,
    name: &'a str,
    path: &'a Path,
    size_bytes: u64,
    created_at_ms: Option<u64>,
    provenance: Option<&'a Provenance>,
}

impl<'a> ArchiveRow<'a> {
    fn new(index: usize, entry: &'a ArchiveEntry) -> Self {
        Self {
            index,
            name: &entry.name,
            path: &entry.path,
            size_bytes: entry.size_bytes,
            created_at_ms: entry.created_at_ms(),
            provenance: entry.provenance.as_ref(),
        }
    }
}

pub async fn run(config: &Config, path: Option<&str>, json: bool, limit: Option<usize>) -> Result<()> {
    match path {
        Some(path) => list_files(config, path, json).await,
        None => list_archives(config, json, limit).await,
    }
}

async fn list_archives(config: &Config, json: bool, limit: Option<usize>) -> Result<()> {
    let catalog = Catalog::load(config).await;
    let shown = catalog.truncated(limit);

    if json {
        let rows: Vec<_> = shown
            .iter()
            .enumerate()
            .map(|(i, e)| ArchiveRow::new(i, e))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if catalog.is_empty() {
        println!("{}", "No archives yet".dimmed());
        println!();
        println!("{}", "Tip: run `cellar pack` to snapshot the private directory".dimmed());
        return Ok(());
    }

    for (index, entry) in shown.iter().enumerate() {
        let when = entry
            .created_at_ms()
            .map(util::format_relative_time)
            .unwrap_or_else(|| "-".to_string());

        let commit = match &entry.provenance {
            Some(p) => format!(
                "{} {}",
                entry.short_hash().unwrap_or_default().yellow(),
                p.message
            ),
            None => "untracked".red().to_string(),
        };

        println!(
            "{:>3}  {}  {:>14}  {:>10}  {}",
            index.cyan(),
            entry.name,
            when.dimmed(),
            util::format_size(entry.size_bytes),
            commit
        );
    }

    if shown.len() < catalog.len() {
        println!("{}", format!("... {} more", catalog.len() - shown.len()).dimmed());
    }

    Ok(())
}

async fn list_files(config: &Config, path: &str, json: bool) -> Result<()> {
    let (spec, catalog) = super::open_path(config, path).await?;
    let entry = resolve(&spec.archive_ref, &catalog)?;

    let listing: Vec<FileMetadata> = SnapshotPipeline::new(config)
        .run(entry, &spec.file_pattern, |set| async move { ops::inspect(&set) })
        .await?
        .require_matches()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{} {}", "Archive:".bold(), entry.name);
    for file in &listing {
        println!(
            "{}  {:>10}  {}",
            util::format_mode(file.mode).dimmed(),
            util::format_size(file.size_bytes),
            file.path.display()
        );
    }
    println!();
    println!("{} files", listing.len());

    Ok(())
}
