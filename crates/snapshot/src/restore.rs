//! Restore the private directory from a snapshot
//!
//! Restoring is destructive: the private directory is removed and recreated
//! from the archive. The archive is decrypted into scratch space first, so a
//! bad key or corrupt archive fails before anything is deleted.

use cellar_core::{ArchiveEntry, Catalog, CellarError, Config};
use serde::Serialize;
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::container;
use crate::scratch::ScratchWorkspace;

/// What a restore did
#[derive(Debug, Clone, Serialize)]
pub struct RestoreOutcome {
    pub archive: String,
    pub restored_to: PathBuf,
    pub files: usize,
}

/// Replaces the private directory with a snapshot's contents
pub struct Restorer<'a> {
    config: &'a Config,
}

impl<'a> Restorer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Entry restored when none is named: the newest committed archive
    ///
    /// Untracked or staged-only archives are only restored by explicit reference.
    pub fn default_entry(catalog: &Catalog) -> crate::Result<&ArchiveEntry> {
        catalog.latest_committed().ok_or_else(|| {
            CellarError::State(
                "no committed archives to restore; commit one or name an archive explicitly"
                    .to_string(),
            )
        })
    }

    pub async fn restore(&self, entry: &ArchiveEntry) -> crate::Result<RestoreOutcome> {
        let scratch = ScratchWorkspace::create(self.config)?;
        let result = self.restore_from(&scratch, entry).await;
        scratch.release();
        result
    }

    async fn restore_from(&self, scratch: &ScratchWorkspace, entry: &ArchiveEntry) -> crate::Result<RestoreOutcome> {
        let container_path = scratch.container_path();
        container::decrypt(self.config, &entry.path, &container_path).await?;

        let private_dir = &self.config.private_dir;
        if private_dir.exists() {
            tokio::fs::remove_dir_all(private_dir)
                .await
                .map_err(CellarError::io(format!("failed to remove {}", private_dir.display())))?;
        }
        tokio::fs::create_dir_all(private_dir)
            .await
            .map_err(CellarError::io(format!("failed to create {}", private_dir.display())))?;

        container::extract(self.config, &container_path, private_dir).await?;

        let files = WalkDir::new(private_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count();

        tracing::info!("Restored {} files from {} into {}", files, entry.name, private_dir.display());

        Ok(RestoreOutcome {
            archive: entry.name.clone(),
            restored_to: private_dir.clone(),
            files,
        })
    }
}
