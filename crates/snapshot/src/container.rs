//! Container steps: decrypt, encrypt, build, extract, list
//!
//! Thin wrappers that turn configured tools into single operations on paths.

use cellar_core::{ArchiveEntry, CellarError, Config, Invocation};
use std::path::Path;

use crate::scratch::ScratchWorkspace;

/// Decrypt `archive` to the plaintext container at `output`
pub async fn decrypt(config: &Config, archive: &Path, output: &Path) -> crate::Result<()> {
    let inv = config.tools.decrypt(archive, output)?;
    config
        .runner()
        .output(&inv)
        .await
        .map_err(|source| CellarError::Decrypt {
            archive: archive.display().to_string(),
            source,
        })?;
    Ok(())
}

/// Encrypt the plaintext container at `input` into `output`
pub async fn encrypt(config: &Config, input: &Path, output: &Path) -> crate::Result<()> {
    let inv = config.tools.encrypt(input, output)?;
    config.runner().output(&inv).await?;
    Ok(())
}

/// Build a plaintext container from the contents of `source_dir`
pub async fn build(config: &Config, source_dir: &Path, output: &Path) -> crate::Result<()> {
    let inv = Invocation::new(&config.tools.tar)
        .arg("-cf")
        .arg(output)
        .arg("-C")
        .arg(source_dir)
        .arg(".");
    config.runner().output(&inv).await?;
    Ok(())
}

/// Unpack every entry of `container` into `dest_dir`, preserving relative paths
pub async fn extract(config: &Config, container: &Path, dest_dir: &Path) -> crate::Result<()> {
    tokio::fs::create_dir_all(dest_dir)
        .await
        .map_err(CellarError::io(format!("failed to create {}", dest_dir.display())))?;

    let inv = Invocation::new(&config.tools.tar)
        .arg("-xf")
        .arg(container)
        .arg("-C")
        .arg(dest_dir);
    config.runner().output(&inv).await?;
    Ok(())
}

/// Member names of a plaintext container
pub async fn list(config: &Config, container: &Path) -> crate::Result<Vec<String>> {
    let inv = Invocation::new(&config.tools.tar).arg("-tf").arg(container);
    Ok(config.runner().output(&inv).await?.lines())
}

/// Decrypt an archive into the workspace and extract it to `contents_dir()`
pub async fn unpack(
    config: &Config,
    entry: &ArchiveEntry,
    scratch: &ScratchWorkspace,
) -> crate::Result<()> {
    let container = scratch.container_path();
    decrypt(config, &entry.path, &container).await?;
    extract(config, &container, &scratch.contents_dir()).await?;
    tracing::debug!("Unpacked {} into {}", entry.name, scratch.path().display());
    Ok(())
}
