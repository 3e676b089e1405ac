//! View files from an archive in the pager

use anyhow::Result;
use cellar_core::{resolve, Config};
use cellar_snapshot::{ops, SnapshotPipeline};

pub async fn run(config: &Config, path: &str) -> Result<()> {
    let (spec, catalog) = super::open_path(config, path).await?;
    let entry = resolve(&spec.archive_ref, &catalog)?;

    SnapshotPipeline::new(config)
        .run(entry, &spec.file_pattern, |set| async move { ops::page(config, &set).await })
        .await?
        .require_matches()?;

    Ok(())
}
