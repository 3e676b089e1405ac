//! CLI command implementations

pub mod cat;
pub mod clean;
pub mod config;
pub mod cp;
pub mod less;
pub mod ls;
pub mod pack;
pub mod restore;
pub mod verify;

use anyhow::{Context, Result};
use cellar_core::{ArchivePathSpec, Catalog, Config};

/// Parse an archive path and load the catalog it will be resolved against
pub(crate) async fn open_path(config: &Config, path: &str) -> Result<(ArchivePathSpec, Catalog)> {
    let spec = ArchivePathSpec::parse(path).with_context(|| format!("Bad archive path '{}'", path))?;
    let catalog = Catalog::load(config).await;
    Ok((spec, catalog))
}
