//! Snapshot pipeline shared by read operations
//!
//! ```text
//! create scratch -> decrypt -> extract -> match pattern -> operate -> release
//! ```
//!
//! The scratch workspace is released on every path out of [`SnapshotPipeline::run`]:
//! success, a failed step, or an error returned by the operation itself.

use cellar_core::pathspec::is_glob;
use cellar_core::{ArchiveEntry, CellarError, Config, Invocation};
use std::future::Future;
use std::path::{Component, Path, PathBuf};

use crate::container;
use crate::scratch::ScratchWorkspace;

/// Files from one archive that matched a pattern
#[derive(Debug, Clone)]
pub struct MatchSet {
    archive: String,
    root: PathBuf,
    files: Vec<PathBuf>,
}

impl MatchSet {
    pub fn new(archive: impl Into<String>, root: PathBuf, files: Vec<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            root,
            files,
        }
    }

    /// Name of the archive the files came from
    pub fn archive(&self) -> &str {
        &self.archive
    }

    /// Extracted tree the relative paths are rooted at
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matched files, relative to [`MatchSet::root`], sorted
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Absolute path of a matched file
    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// More than one file matched, so output needs per-file headers
    pub fn needs_headers(&self) -> bool {
        self.files.len() > 1
    }
}

/// Result of a pipeline run
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran over at least one file
    Completed(T),
    /// Nothing matched; the operation was not run
    NoMatches { archive: String, pattern: String },
}

impl<T> Outcome<T> {
    /// Turn "no files matching" into a `NotFound` error
    pub fn require_matches(self) -> crate::Result<T> {
        match self {
            Outcome::Completed(value) => Ok(value),
            Outcome::NoMatches { archive, pattern } => Err(CellarError::NotFound(format!(
                "no files matching '{}' in {}",
                pattern, archive
            ))),
        }
    }
}

/// Decrypt/extract/operate/cleanup sequence
pub struct SnapshotPipeline<'a> {
    config: &'a Config,
}

impl<'a> SnapshotPipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Unpack `entry`, match `pattern`, and hand the matches to `op`
    pub async fn run<T, F, Fut>(&self, entry: &ArchiveEntry, pattern: &str, op: F) -> crate::Result<Outcome<T>>
    where
        F: FnOnce(MatchSet) -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        let scratch = ScratchWorkspace::create(self.config)?;
        let result = self.run_in(&scratch, entry, pattern, op).await;
        scratch.release();
        result
    }

    async fn run_in<T, F, Fut>(
        &self,
        scratch: &ScratchWorkspace,
        entry: &ArchiveEntry,
        pattern: &str,
        op: F,
    ) -> crate::Result<Outcome<T>>
    where
        F: FnOnce(MatchSet) -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        container::unpack(self.config, entry, scratch).await?;

        let root = scratch.contents_dir();
        let files = find_matches(self.config, &root, pattern).await?;

        if files.is_empty() {
            tracing::debug!("No files matching '{}' in {}", pattern, entry.name);
            return Ok(Outcome::NoMatches {
                archive: entry.name.clone(),
                pattern: pattern.to_string(),
            });
        }

        op(MatchSet::new(entry.name.as_str(), root, files)).await.map(Outcome::Completed)
    }
}

/// Resolve a pattern against an extracted tree
///
/// Globs go to `find` restricted to regular files; literal paths are checked
/// directly after dropping any leading `./`.
pub async fn find_matches(config: &Config, root: &Path, pattern: &str) -> crate::Result<Vec<PathBuf>> {
    if is_glob(pattern) {
        let inv = Invocation::new(&config.tools.find)
            .args([".", "-type", "f", "-path"])
            .arg(format!("./{}", pattern))
            .current_dir(root);

        let mut files: Vec<PathBuf> = config
            .runner()
            .output(&inv)
            .await?
            .lines()
            .into_iter()
            .map(|line| PathBuf::from(line.strip_prefix("./").unwrap_or(&line)))
            .collect();
        files.sort();
        return Ok(files);
    }

    let relative = literal_path(pattern)?;
    if root.join(&relative).is_file() {
        Ok(vec![relative])
    } else {
        Ok(Vec::new())
    }
}

/// Normalise a literal pattern, refusing anything that leaves the tree
fn literal_path(pattern: &str) -> crate::Result<PathBuf> {
    let mut trimmed = pattern;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }

    let path = PathBuf::from(trimmed);
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(CellarError::InvalidPath(pattern.to_string())),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(CellarError::InvalidPath(pattern.to_string()));
    }
    Ok(normalized)
}
