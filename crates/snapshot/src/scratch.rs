//! Scratch workspaces
//!
//! Each operation gets its own uniquely named temporary directory holding at
//! most one decrypted container and its extracted contents. The directory is
//! removed when the workspace is released or dropped, including during a
//! panic unwinding through the operation.

use cellar_core::{CellarError, Config};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PREFIX: &str = "cellar-";
const CONTAINER_NAME: &str = "container.tar";
const CONTENTS_NAME: &str = "contents";

/// Temporary directory owned by one operation
#[derive(Debug)]
pub struct ScratchWorkspace {
    dir: TempDir,
}

impl ScratchWorkspace {
    /// Create a fresh workspace under the configured scratch directory
    pub fn create(config: &Config) -> crate::Result<Self> {
        std::fs::create_dir_all(&config.scratch_dir).map_err(CellarError::io(format!(
            "failed to create scratch directory {}",
            config.scratch_dir.display()
        )))?;

        let dir = tempfile::Builder::new()
            .prefix(PREFIX)
            .tempdir_in(&config.scratch_dir)
            .map_err(CellarError::io("failed to create scratch workspace"))?;

        tracing::debug!("Created scratch workspace {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the decrypted plaintext container goes
    pub fn container_path(&self) -> PathBuf {
        self.dir.path().join(CONTAINER_NAME)
    }

    /// Where the container is extracted
    pub fn contents_dir(&self) -> PathBuf {
        self.dir.path().join(CONTENTS_NAME)
    }

    /// Remove the workspace now, logging instead of failing on error
    pub fn release(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => tracing::debug!("Removed scratch workspace {}", path.display()),
            Err(e) => tracing::warn!("Failed to remove scratch workspace {}: {}", path.display(), e),
        }
    }
}
