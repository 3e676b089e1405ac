//! Error taxonomy shared by every cellar crate

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure of one external tool invocation
#[derive(Debug, Error)]
pub enum ToolError {
    /// The executable could not be started at all
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The executable ran and exited with an unaccepted status
    #[error("`{program}` exited with status {code}: {stderr}")]
    Exit {
        program: String,
        code: i32,
        stderr: String,
    },

    /// The executable did not finish within the configured timeout
    #[error("`{program}` timed out after {}s", .after.as_secs())]
    Timeout { program: String, after: Duration },
}

impl ToolError {
    /// Name of the program that failed
    pub fn program(&self) -> &str {
        match self {
            ToolError::Spawn { program, .. }
            | ToolError::Exit { program, .. }
            | ToolError::Timeout { program, .. } => program,
        }
    }
}

/// Errors surfaced by cellar operations
#[derive(Debug, Error)]
pub enum CellarError {
    /// Bad reference, empty catalog, or no matching files
    #[error("{0}")]
    NotFound(String),

    /// Archive path could not be parsed
    #[error("invalid archive path '{0}'")]
    InvalidPath(String),

    /// An external tool failed
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// Decryption of an archive failed
    #[error("failed to decrypt {archive}: {source}")]
    Decrypt {
        archive: String,
        #[source]
        source: ToolError,
    },

    /// Archive decrypted but its contents are unusable
    #[error("archive {archive} failed integrity check: {detail}")]
    Integrity { archive: String, detail: String },

    /// Project state does not allow the operation
    #[error("{0}")]
    State(String),

    /// Working directory matches the latest snapshot
    #[error("no changes since {latest}; use --force to pack anyway")]
    NoChanges { latest: String },

    /// Configuration file is missing values or malformed
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Filesystem error with the operation that caused it
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CellarError {
    /// Build a mapper that wraps an `io::Error` with context
    ///
    /// ```ignore
    /// fs::create_dir_all(&dir).map_err(CellarError::io("failed to create archive directory"))?;
    /// ```
    pub fn io(context: impl Into<String>) -> impl FnOnce(io::Error) -> CellarError {
        let context = context.into();
        move |source| CellarError::Io { context, source }
    }

    /// True for failures the user caused by naming something that is not there
    pub fn is_not_found(&self) -> bool {
        matches!(self, CellarError::NotFound(_))
    }
}
