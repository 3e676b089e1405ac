//! Version-control queries
//!
//! All queries run `git -C <archive_dir> ...`, so the archive directory may
//! sit anywhere inside the work tree. A missing repository or untracked file
//! is never an error for provenance lookups; it simply yields no provenance.

use crate::catalog::Provenance;
use crate::config::Config;
use crate::error::ToolError;
use crate::tool::{Invocation, ToolRunner};
use serde::Serialize;
use std::path::Path;

/// Field separator used in `--format` strings (ASCII unit separator)
const SEP: char = '\x1f';

/// Commit metadata as reported by `git show`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub short_hash: String,
    pub author: String,
    /// Commit time (Unix seconds)
    pub timestamp: i64,
    pub subject: String,
}

/// Git adapter bound to one project
pub struct Git<'a> {
    config: &'a Config,
    runner: ToolRunner,
}

impl<'a> Git<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            runner: config.runner(),
        }
    }

    fn git(&self) -> Invocation {
        Invocation::new(&self.config.tools.git)
            .arg("-C")
            .arg(&self.config.archive_dir)
    }

    /// Most recent commit touching `path`, or `None` when it has no history
    pub async fn provenance(&self, path: &Path) -> Option<Provenance> {
        let inv = self
            .git()
            .args(["log", "-1", "--format=%H%x1f%an%x1f%s", "--"])
            .arg(path);

        match self.runner.output(&inv).await {
            Ok(out) => parse_provenance(&out.stdout_str()),
            Err(e) => {
                tracing::debug!("No provenance for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Full metadata for a commit hash
    pub async fn commit_info(&self, hash: &str) -> Result<CommitInfo, ToolError> {
        let inv = self
            .git()
            .args(["show", "-s", "--format=%h%x1f%an%x1f%at%x1f%s", hash]);

        let out = self.runner.output(&inv).await?;
        parse_commit_info(&out.stdout_str()).ok_or_else(|| ToolError::Exit {
            program: self.config.tools.git.clone(),
            code: 0,
            stderr: format!("unexpected `git show` output for {}", hash),
        })
    }

    /// True if the archive directory is inside a git work tree
    pub async fn is_inside_work_tree(&self) -> bool {
        let inv = self.git().args(["rev-parse", "--is-inside-work-tree"]);
        match self.runner.output(&inv).await {
            Ok(out) => out.stdout_str().trim() == "true",
            Err(_) => false,
        }
    }

    /// True if `path` is in the index (committed or staged)
    pub async fn is_tracked(&self, path: &Path) -> Result<bool, ToolError> {
        let inv = self
            .git()
            .args(["ls-files", "--error-unmatch", "--"])
            .arg(path)
            .accept_exit_code(1);

        Ok(self.runner.output(&inv).await?.code == 0)
    }

    /// True if the file on disk equals its content at `hash`
    pub async fn matches_commit(&self, hash: &str, path: &Path) -> Result<bool, ToolError> {
        let inv = self
            .git()
            .args(["diff", "--quiet", hash, "--"])
            .arg(path)
            .accept_exit_code(1);

        Ok(self.runner.output(&inv).await?.code == 0)
    }

    /// Stage a file for the next commit
    pub async fn stage(&self, path: &Path) -> Result<(), ToolError> {
        let inv = self.git().args(["add", "--"]).arg(path);
        self.runner.output(&inv).await?;
        Ok(())
    }
}

fn parse_provenance(stdout: &str) -> Option<Provenance> {
    let line = stdout.lines().next()?.trim_end();
    if line.is_empty() {
        return None;
    }

    let mut fields = line.splitn(3, SEP);
    let commit_hash = fields.next()?.to_string();
    let author = fields.next().unwrap_or_default().to_string();
    let message = fields.next().unwrap_or_default().to_string();

    if commit_hash.is_empty() {
        return None;
    }

    Some(Provenance {
        commit_hash,
        author,
        message,
    })
}

fn parse_commit_info(stdout: &str) -> Option<CommitInfo> {
    let line = stdout.lines().next()?.trim_end();
    let mut fields = line.splitn(4, SEP);

    Some(CommitInfo {
        short_hash: fields.next().filter(|h| !h.is_empty())?.to_string(),
        author: fields.next()?.to_string(),
        timestamp: fields.next()?.parse().ok()?,
        subject: fields.next().unwrap_or_default().to_string(),
    })
}
