//! Snapshot creation
//!
//! A new archive is only created when the private directory differs from the
//! latest snapshot, unless forced or no snapshot exists yet. The archive is
//! named `<ULID><suffix>` so name order is creation order, and it is staged
//! (not committed) when the archive directory lives in a git work tree.

use cellar_core::{ArchiveEntry, Catalog, CellarError, Config, Git};
use serde::Serialize;
use std::path::PathBuf;
use ulid::Ulid;

use crate::changes::ChangeDetector;
use crate::container;
use crate::scratch::ScratchWorkspace;

/// What a pack produced
#[derive(Debug, Clone, Serialize)]
pub struct PackOutcome {
    pub archive: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Staged for commit
    pub staged: bool,
}

/// Orchestrates snapshot creation
pub struct Packer<'a> {
    config: &'a Config,
}

impl<'a> Packer<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn pack(&self, force: bool) -> crate::Result<PackOutcome> {
        let archive_dir = &self.config.archive_dir;
        let private_dir = &self.config.private_dir;

        for dir in [archive_dir, private_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(CellarError::io(format!("failed to create {}", dir.display())))?;
        }

        if is_empty_dir(private_dir)? {
            return Err(CellarError::State(format!(
                "{} is empty, nothing to pack",
                private_dir.display()
            )));
        }

        let catalog = Catalog::load(self.config).await;
        match catalog.latest() {
            Some(latest) if !force => {
                let detector = ChangeDetector::new(self.config);
                if !detector.has_changes(latest, private_dir).await? {
                    return Err(CellarError::NoChanges {
                        latest: latest.name.clone(),
                    });
                }
            }
            Some(_) => tracing::info!("Forced pack, skipping change detection"),
            None => tracing::info!("No archives yet, creating the first one"),
        }

        self.create(catalog.latest()).await
    }

    async fn create(&self, latest: Option<&ArchiveEntry>) -> crate::Result<PackOutcome> {
        let name = next_name(latest, &self.config.suffix);
        let path = self.config.archive_path(&name);

        let scratch = ScratchWorkspace::create(self.config)?;
        let result = self.seal(&scratch, &path).await;
        scratch.release();

        if let Err(e) = result {
            // Never leave a half-written archive behind for the catalog to pick up
            if path.exists() {
                if let Err(rm) = std::fs::remove_file(&path) {
                    tracing::warn!("Failed to remove partial archive {}: {}", path.display(), rm);
                }
            }
            return Err(e);
        }

        let size_bytes = std::fs::metadata(&path)
            .map_err(CellarError::io(format!("failed to stat {}", path.display())))?
            .len();

        let git = Git::new(self.config);
        let staged = if git.is_inside_work_tree().await {
            match git.stage(&path).await {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Created {} but could not stage it: {}", name, e);
                    false
                }
            }
        } else {
            tracing::warn!("{} is not inside a git work tree; archive not staged", self.config.archive_dir.display());
            false
        };

        tracing::info!("Created archive {} ({} bytes)", name, size_bytes);

        Ok(PackOutcome {
            archive: name,
            path,
            size_bytes,
            staged,
        })
    }

    async fn seal(&self, scratch: &ScratchWorkspace, output: &std::path::Path) -> crate::Result<()> {
        let container_path = scratch.container_path();
        container::build(self.config, &self.config.private_dir, &container_path).await?;
        container::encrypt(self.config, &container_path, output).await
    }
}

/// ULID-based name that sorts after `latest`, even within the same millisecond
fn next_name(latest: Option<&ArchiveEntry>, suffix: &str) -> String {
    let mut id = Ulid::new();

    let previous = latest
        .and_then(|e| e.name.strip_suffix(suffix))
        .and_then(|stem| Ulid::from_string(stem).ok());
    if let Some(previous) = previous {
        if id <= previous {
            id = previous.increment().unwrap_or(id);
        }
    }

    format!("{}{}", id, suffix)
}

fn is_empty_dir(dir: &std::path::Path) -> crate::Result<bool> {
    let mut entries = std::fs::read_dir(dir)
        .map_err(CellarError::io(format!("failed to read {}", dir.display())))?;
    Ok(entries.next().is_none())
}
