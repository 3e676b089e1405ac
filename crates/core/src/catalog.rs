//! Archive catalog
//!
//! The catalog is rebuilt from disk on every invocation. Entries are ordered
//! by file name descending; since names start with a ULID (or any
//! lexicographic timestamp), index 0 is the newest archive present on disk.

use crate::config::Config;
use crate::vcs::Git;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use ulid::Ulid;

/// Version-control commit that last touched an archive file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub commit_hash: String,
    pub author: String,
    pub message: String,
}

/// One encrypted snapshot file on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntry {
    /// File name (encodes creation order lexicographically)
    pub name: String,
    /// Full path to the archive
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Present only when the file has commit history
    pub provenance: Option<Provenance>,
}

impl ArchiveEntry {
    /// Creation time decoded from a ULID-prefixed name (Unix milliseconds)
    pub fn created_at_ms(&self) -> Option<u64> {
        let stem = self.name.split('.').next()?;
        Ulid::from_string(stem).ok().map(|id| id.timestamp_ms())
    }

    pub fn is_committed(&self) -> bool {
        self.provenance.is_some()
    }

    /// Short commit hash for display
    pub fn short_hash(&self) -> Option<&str> {
        self.provenance
            .as_ref()
            .map(|p| &p.commit_hash[..p.commit_hash.len().min(8)])
    }
}

/// Ordered, read-only view of every archive present on disk
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ArchiveEntry>,
}

impl Catalog {
    /// Build a catalog from entries, enforcing name-descending order
    pub fn from_entries(mut entries: Vec<ArchiveEntry>) -> Self {
        entries.sort_by(|a, b| b.name.cmp(&a.name));
        Self { entries }
    }

    /// Enumerate the archive directory and attach provenance
    ///
    /// An unreadable archive directory yields an empty catalog and a warning.
    /// Provenance lookups that fail degrade to `None` for that entry only.
    pub async fn load(config: &Config) -> Self {
        let mut entries = Vec::new();

        let mut dir = match tokio::fs::read_dir(&config.archive_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                tracing::warn!(
                    "Cannot read archive directory {}: {}",
                    config.archive_dir.display(),
                    e
                );
                return Self::default();
            }
        };

        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Failed to read archive directory entry: {}", e);
                    break;
                }
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if !config.is_container_name(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            entries.push(ArchiveEntry {
                path: entry.path(),
                name,
                size_bytes: metadata.len(),
                provenance: None,
            });
        }

        let mut catalog = Self::from_entries(entries);

        let git = Git::new(config);
        for entry in &mut catalog.entries {
            entry.provenance = git.provenance(&entry.path).await;
        }

        tracing::debug!("Catalog holds {} archives", catalog.len());
        catalog
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ArchiveEntry> {
        self.entries.get(index)
    }

    /// Lexicographically greatest name present on disk
    pub fn latest(&self) -> Option<&ArchiveEntry> {
        self.entries.first()
    }

    /// Newest entry that has commit history
    ///
    /// Differs from [`Catalog::latest`] whenever the newest archive is
    /// untracked or only staged.
    pub fn latest_committed(&self) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.is_committed())
    }

    /// At most `limit` newest entries, for display
    pub fn truncated(&self, limit: Option<usize>) -> &[ArchiveEntry] {
        match limit {
            Some(n) => &self.entries[..n.min(self.entries.len())],
            None => &self.entries,
        }
    }

    /// Position of an entry by name
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}
