//! Operations applied to matched files inside an unpacked snapshot

use cellar_core::{CellarError, Config, Invocation};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::pipeline::MatchSet;

/// Write every matched file to `out`, with `==> path <==` headers when
/// more than one file matched
pub fn emit<W: Write>(set: &MatchSet, out: &mut W) -> crate::Result<()> {
    for (i, relative) in set.files().iter().enumerate() {
        let content = fs::read(set.absolute(relative))
            .map_err(CellarError::io(format!("failed to read {}", relative.display())))?;

        let header = set.needs_headers().then_some((i > 0, relative.as_path()));
        write_file(out, header, &content).map_err(CellarError::io("failed to write output"))?;
    }

    out.flush().map_err(CellarError::io("failed to flush output"))
}

fn write_file<W: Write>(out: &mut W, header: Option<(bool, &Path)>, content: &[u8]) -> std::io::Result<()> {
    if let Some((separate, path)) = header {
        if separate {
            writeln!(out)?;
        }
        writeln!(out, "==> {} <==", path.display())?;
    }
    out.write_all(content)
}

/// Copy matched files out of the snapshot
///
/// One match: into `dest` if it is an existing directory or ends with a
/// separator, else to `dest`.
/// Several matches: `dest` is a directory and relative paths are kept.
pub fn copy_to(set: &MatchSet, dest: &Path) -> crate::Result<Vec<PathBuf>> {
    let mut copied = Vec::with_capacity(set.len());

    if let [single] = set.files() {
        let target = if dest.is_dir() || names_directory(dest) {
            dest.join(single.file_name().unwrap_or(single.as_os_str()))
        } else {
            dest.to_path_buf()
        };
        copy_file(&set.absolute(single), &target)?;
        copied.push(target);
        return Ok(copied);
    }

    if dest.exists() && !dest.is_dir() {
        return Err(CellarError::State(format!(
            "{} files matched but {} is not a directory",
            set.len(),
            dest.display()
        )));
    }

    for relative in set.files() {
        let target = dest.join(relative);
        copy_file(&set.absolute(relative), &target)?;
        copied.push(target);
    }

    Ok(copied)
}

/// `dest/` spells a directory even before it exists
fn names_directory(dest: &Path) -> bool {
    let raw = dest.as_os_str().to_string_lossy();
    raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR)
}

fn copy_file(source: &Path, target: &Path) -> crate::Result<()> {
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(CellarError::io(format!("failed to create {}", parent.display())))?;
    }
    fs::copy(source, target)
        .map_err(CellarError::io(format!("failed to copy to {}", target.display())))?;
    tracing::debug!("Copied {} -> {}", source.display(), target.display());
    Ok(())
}

/// Stream matched files through the configured pager
pub async fn page(config: &Config, set: &MatchSet) -> crate::Result<()> {
    let mut buffer = Vec::new();
    emit(set, &mut buffer)?;

    let inv = Invocation::new(config.tools.pager_program());
    config.runner().feed(&inv, &buffer).await?;
    Ok(())
}

/// Metadata for one file inside an archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// Unix permission bits (0 on other platforms)
    pub mode: u32,
}

/// List metadata of matched files
pub fn inspect(set: &MatchSet) -> crate::Result<Vec<FileMetadata>> {
    set.files()
        .iter()
        .map(|relative| {
            let metadata = fs::metadata(set.absolute(relative))
                .map_err(CellarError::io(format!("failed to stat {}", relative.display())))?;

            #[cfg(unix)]
            let mode = {
                use std::os::unix::fs::PermissionsExt;
                metadata.permissions().mode() & 0o7777
            };
            #[cfg(not(unix))]
            let mode = 0;

            Ok(FileMetadata {
                path: relative.clone(),
                size_bytes: metadata.len(),
                mode,
            })
        })
        .collect()
}
