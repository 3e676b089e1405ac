//! Print files from an archive

use anyhow::Result;
use cellar_core::{resolve, Config};
use cellar_snapshot::{ops, SnapshotPipeline};

pub async fn run(config: &Config, path: &str) -> Result<()> {
    let (spec, catalog) = super::open_path(config, path).await?;
    let entry = resolve(&spec.archive_ref, &catalog)?;

    SnapshotPipeline::new(config)
        .run(entry, &spec.file_pattern, |set| {
            let result = ops::emit(&set, &mut std::io::stdout().lock());
            async move { result }
        })
        .await?
        .require_matches()?;

    Ok(())
}
