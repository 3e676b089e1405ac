//! Snapshot operations for cellar
//!
//! This crate provides everything that decrypts or produces an archive:
//! - Scratch workspaces that are removed on every exit path
//! - The decrypt -> extract -> operate -> cleanup pipeline
//! - Change detection against the latest snapshot
//! - Two-stage verification (container, then provenance)
//! - Restore, pack and untracked-archive cleanup

pub mod changes;
pub mod clean;
pub mod container;
pub mod ops;
pub mod pack;
pub mod pipeline;
pub mod restore;
pub mod scratch;
pub mod verify;

// Re-exports
pub use changes::ChangeDetector;
pub use clean::{clean_untracked, CleanOutcome};
pub use ops::FileMetadata;
pub use pack::{PackOutcome, Packer};
pub use pipeline::{MatchSet, Outcome, SnapshotPipeline};
pub use restore::{RestoreOutcome, Restorer};
pub use scratch::ScratchWorkspace;
pub use verify::{Verification, VerificationReport, Verifier};

/// Result type for snapshot operations
pub type Result<T> = cellar_core::Result<T>;
