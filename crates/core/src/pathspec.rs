//! Archive path spec parsing
//!
//! `/<archive-ref>/<file-glob>` selects files inside one archive. The leading
//! slash is optional and the glob defaults to every file:
//!
//! ```text
//! /latest/notes/*.md   -> ref "latest", pattern "notes/*.md"
//! 2/keys.txt           -> ref "2",      pattern "keys.txt"
//! /abc123              -> ref "abc123", pattern "*"
//! ```

use crate::error::CellarError;
use crate::Result;

/// Pattern matching every file in an archive
pub const MATCH_ALL: &str = "*";

/// Characters that make a pattern a glob rather than a literal path
const WILDCARDS: &[char] = &['*', '?', '['];

/// Parsed `/<ref>/<pattern>` string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePathSpec {
    /// Raw reference token, not yet resolved
    pub archive_ref: String,
    /// Glob or literal path relative to the archive root
    pub file_pattern: String,
}

impl ArchivePathSpec {
    /// Split a combined archive path
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        let archive_ref = segments
            .next()
            .ok_or_else(|| CellarError::InvalidPath(path.to_string()))?
            .to_string();

        let rest: Vec<&str> = segments.collect();
        let file_pattern = if rest.is_empty() {
            MATCH_ALL.to_string()
        } else {
            rest.join("/")
        };

        Ok(Self {
            archive_ref,
            file_pattern,
        })
    }

    /// True if the pattern needs glob expansion
    pub fn has_wildcards(&self) -> bool {
        is_glob(&self.file_pattern)
    }
}

/// True if a pattern contains glob metacharacters
pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(WILDCARDS)
}
