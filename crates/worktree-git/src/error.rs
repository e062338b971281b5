use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git operation failed")]
    Git(#[from] git2::Error),

    #[error("not a git repository: '{path}'")]
    NotARepository { path: PathBuf },

    #[error("failed to run '{program}'")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`git {command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`git {command}` was cancelled")]
    Cancelled { command: String },

    #[error("unexpected output from `git {command}`: {detail}")]
    InvalidOutput { command: String, detail: String },

    #[error("failed to resolve reference '{refspec}'")]
    RefNotFound { refspec: String },

    #[error("HEAD has no commits yet")]
    UnbornHead,

    #[error("HEAD is detached, not on a branch")]
    DetachedHead,

    #[error("failed to prepare temporary file")]
    TempFile(#[source] std::io::Error),
}

impl GitError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
