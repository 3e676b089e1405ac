//! Change detection against the latest snapshot
//!
//! The latest archive is unpacked into a scratch workspace and compared with
//! the working directory using a recursive diff. Any diff output (added,
//! removed, or modified files) means the directory changed.

use cellar_core::{ArchiveEntry, Config, Invocation};
use std::path::Path;

use crate::container;
use crate::scratch::ScratchWorkspace;

/// Decides whether a new snapshot is needed
pub struct ChangeDetector<'a> {
    config: &'a Config,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// True if `current_dir` differs from the contents of `latest`
    pub async fn has_changes(&self, latest: &ArchiveEntry, current_dir: &Path) -> crate::Result<bool> {
        let scratch = ScratchWorkspace::create(self.config)?;
        let result = self.compare(&scratch, latest, current_dir).await;
        scratch.release();
        result
    }

    async fn compare(
        &self,
        scratch: &ScratchWorkspace,
        latest: &ArchiveEntry,
        current_dir: &Path,
    ) -> crate::Result<bool> {
        container::unpack(self.config, latest, scratch).await?;

        // diff exits 1 when trees differ; only >1 is trouble
        let inv = Invocation::new(&self.config.tools.diff)
            .arg("-r")
            .arg(scratch.contents_dir())
            .arg(current_dir)
            .accept_exit_code(1);

        let out = self.config.runner().output(&inv).await?;
        let changed = !out.stdout.iter().all(u8::is_ascii_whitespace);

        tracing::debug!(
            archive = %latest.name,
            changed,
            "Compared working directory with latest snapshot"
        );
        Ok(changed)
    }
}
