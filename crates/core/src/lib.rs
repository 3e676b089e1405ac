//! Cellar Core - catalog and reference primitives for encrypted archive snapshots
//!
//! This crate provides the read-only foundation every command builds on:
//! - Project configuration (`cellar.toml`)
//! - External tool adapter (structured argv, no shell)
//! - Archive catalog with version-control provenance
//! - Reference resolution (`latest`, index, commit-hash prefix)
//! - Archive path spec parsing (`/<ref>/<glob>`)

pub mod catalog;
pub mod config;
pub mod error;
pub mod pathspec;
pub mod reference;
pub mod tool;
pub mod vcs;

// Re-export main types for convenience
pub use catalog::{ArchiveEntry, Catalog, Provenance};
pub use config::{Config, ConfigFile, ToolsConfig};
pub use error::{CellarError, ToolError};
pub use pathspec::ArchivePathSpec;
pub use reference::{resolve, ArchiveRef};
pub use tool::{Invocation, ToolOutput, ToolRunner};
pub use vcs::{CommitInfo, Git};

/// Common result type used throughout cellar
pub type Result<T> = std::result::Result<T, CellarError>;
