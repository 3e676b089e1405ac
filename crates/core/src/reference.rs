//! Archive reference resolution
//!
//! A reference is one of:
//! - `latest`: the newest archive on disk (catalog index 0)
//! - a non-negative integer: zero-based index, newest first
//! - anything else: a commit-hash prefix
//!
//! Hash prefixes resolve first-match in catalog order. When two commits
//! share a prefix the newer archive wins without complaint.

use crate::catalog::{ArchiveEntry, Catalog};
use crate::error::CellarError;
use crate::Result;
use std::fmt;

/// Keyword for the newest archive
pub const LATEST: &str = "latest";

/// Parsed form of a user-supplied archive reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveRef {
    Latest,
    Index(usize),
    HashPrefix(String),
}

impl ArchiveRef {
    /// Classify a raw token
    pub fn parse(reference: &str) -> Result<Self> {
        if reference.is_empty() {
            return Err(CellarError::NotFound("empty archive reference".to_string()));
        }

        if reference == LATEST {
            return Ok(ArchiveRef::Latest);
        }

        if reference.bytes().all(|b| b.is_ascii_digit()) {
            // Too large for usize is still an index, just one that is out of bounds
            return Ok(ArchiveRef::Index(reference.parse().unwrap_or(usize::MAX)));
        }

        Ok(ArchiveRef::HashPrefix(reference.to_string()))
    }

    /// Find the catalog entry this reference names
    pub fn find<'c>(&self, catalog: &'c Catalog) -> Result<&'c ArchiveEntry> {
        match self {
            ArchiveRef::Latest => catalog
                .latest()
                .ok_or_else(|| CellarError::NotFound("no archives found".to_string())),
            ArchiveRef::Index(index) => catalog.get(*index).ok_or_else(|| {
                CellarError::NotFound(format!(
                    "archive index {} out of range ({} archives)",
                    index,
                    catalog.len()
                ))
            }),
            ArchiveRef::HashPrefix(prefix) => catalog
                .entries()
                .iter()
                .find(|e| {
                    e.provenance
                        .as_ref()
                        .is_some_and(|p| p.commit_hash.starts_with(prefix.as_str()))
                })
                .ok_or_else(|| {
                    CellarError::NotFound(format!("no archive with commit matching '{}'", prefix))
                }),
        }
    }
}

impl fmt::Display for ArchiveRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveRef::Latest => f.write_str(LATEST),
            ArchiveRef::Index(i) => write!(f, "{}", i),
            ArchiveRef::HashPrefix(p) => f.write_str(p),
        }
    }
}

/// Resolve a raw reference against a catalog
pub fn resolve<'c>(reference: &str, catalog: &'c Catalog) -> Result<&'c ArchiveEntry> {
    ArchiveRef::parse(reference)?.find(catalog)
}
