//! Copy files out of an archive

use anyhow::Result;
use cellar_core::{resolve, Config};
use cellar_snapshot::{ops, SnapshotPipeline};
use owo_colors::OwoColorize;
use std::path::Path;

pub async fn run(config: &Config, path: &str, dest: &Path) -> Result<()> {
    let (spec, catalog) = super::open_path(config, path).await?;
    let entry = resolve(&spec.archive_ref, &catalog)?;

    let copied = SnapshotPipeline::new(config)
        .run(entry, &spec.file_pattern, |set| {
            let result = ops::copy_to(&set, dest);
            async move { result }
        })
        .await?
        .require_matches()?;

    for target in &copied {
        println!("{} {}", "✓".green(), target.display());
    }
    println!("Copied {} files from {}", copied.len().to_string().green(), entry.name);

    Ok(())
}
