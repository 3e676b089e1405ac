//! Two-stage archive verification
//!
//! Stage one decrypts the archive and lists the container; both must succeed
//! for the archive to be valid. Stage two looks up the recorded commit and
//! checks the file on disk still matches it. A failed lookup is reported as
//! a warning; a mismatch invalidates the archive.
//!
//! Batches check every entry even after a failure.

use cellar_core::{ArchiveEntry, CellarError, CommitInfo, Config, Git};
use serde::Serialize;

use crate::container;
use crate::scratch::ScratchWorkspace;

/// Result of verifying one archive
#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub archive: String,
    pub valid: bool,
    /// Summary on success, error message on failure
    pub detail: String,
    /// Number of container members, when the container could be read
    pub entries: Option<usize>,
    /// Metadata of the recorded commit, when available
    pub commit: Option<CommitInfo>,
    /// Non-fatal problems, such as a failed provenance lookup
    pub warnings: Vec<String>,
}

impl Verification {
    fn new(entry: &ArchiveEntry) -> Self {
        Self {
            archive: entry.name.clone(),
            valid: false,
            detail: String::new(),
            entries: None,
            commit: None,
            warnings: Vec::new(),
        }
    }

    fn fail(mut self, err: &CellarError) -> Self {
        self.valid = false;
        self.detail = err.to_string();
        self
    }
}

/// Results of a batch, in catalog order
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub results: Vec<Verification>,
}

impl VerificationReport {
    pub fn all_valid(&self) -> bool {
        self.results.iter().all(|r| r.valid)
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.valid).count()
    }
}

/// Runs the verification protocol
pub struct Verifier<'a> {
    config: &'a Config,
    git: Git<'a>,
}

impl<'a> Verifier<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            git: Git::new(config),
        }
    }

    /// Verify a batch of entries; one failure never stops the rest
    pub async fn verify_all(&self, entries: &[ArchiveEntry]) -> VerificationReport {
        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(self.verify(entry).await);
        }
        VerificationReport { results }
    }

    /// Verify one entry
    pub async fn verify(&self, entry: &ArchiveEntry) -> Verification {
        let report = Verification::new(entry);

        let scratch = match ScratchWorkspace::create(self.config) {
            Ok(scratch) => scratch,
            Err(e) => return report.fail(&e),
        };
        let report = self.check_container(&scratch, entry, report).await;
        scratch.release();

        if !report.valid {
            tracing::warn!("Archive {} failed verification: {}", entry.name, report.detail);
            return report;
        }

        self.check_provenance(entry, report).await
    }

    async fn check_container(
        &self,
        scratch: &ScratchWorkspace,
        entry: &ArchiveEntry,
        mut report: Verification,
    ) -> Verification {
        let container_path = scratch.container_path();

        if let Err(e) = container::decrypt(self.config, &entry.path, &container_path).await {
            return report.fail(&e);
        }

        match container::list(self.config, &container_path).await {
            Ok(members) => {
                report.valid = true;
                report.entries = Some(members.len());
                report.detail = format!("{} entries", members.len());
                report
            }
            Err(e) => report.fail(&CellarError::Integrity {
                archive: entry.name.clone(),
                detail: format!("container unreadable: {}", e),
            }),
        }
    }

    async fn check_provenance(&self, entry: &ArchiveEntry, mut report: Verification) -> Verification {
        let Some(provenance) = &entry.provenance else {
            report.warnings.push("untracked: no commit history".to_string());
            return report;
        };

        match self.git.commit_info(&provenance.commit_hash).await {
            Ok(info) => report.commit = Some(info),
            Err(e) => report
                .warnings
                .push(format!("commit {} lookup failed: {}", provenance.commit_hash, e)),
        }

        match self.git.matches_commit(&provenance.commit_hash, &entry.path).await {
            Ok(true) => report,
            Ok(false) => report.fail(&CellarError::Integrity {
                archive: entry.name.clone(),
                detail: format!("file differs from commit {}", provenance.commit_hash),
            }),
            Err(e) => {
                report.warnings.push(format!("content check skipped: {}", e));
                report
            }
        }
    }
}
