//! Removal of archives that version control does not track

use cellar_core::{Catalog, CellarError, Config, Git};
use serde::Serialize;

/// What a clean removed (or would remove)
#[derive(Debug, Clone, Serialize)]
pub struct CleanOutcome {
    pub removed: Vec<String>,
    pub kept: usize,
    pub dry_run: bool,
}

/// Delete archives that are neither committed nor staged
///
/// Refuses to run outside a git work tree, where every archive would look untracked.
pub async fn clean_untracked(config: &Config, catalog: &Catalog, dry_run: bool) -> crate::Result<CleanOutcome> {
    let git = Git::new(config);
    if !git.is_inside_work_tree().await {
        return Err(CellarError::State(format!(
            "{} is not inside a git work tree; refusing to clean",
            config.archive_dir.display()
        )));
    }

    let mut removed = Vec::new();
    let mut kept = 0;

    for entry in catalog.entries() {
        if git.is_tracked(&entry.path).await? {
            kept += 1;
            continue;
        }

        if !dry_run {
            tokio::fs::remove_file(&entry.path)
                .await
                .map_err(CellarError::io(format!("failed to remove {}", entry.path.display())))?;
            tracing::info!("Removed untracked archive {}", entry.name);
        }
        removed.push(entry.name.clone());
    }

    Ok(CleanOutcome {
        removed,
        kept,
        dry_run,
    })
}
