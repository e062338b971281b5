use std::path::PathBuf;

use thiserror::Error;
use worktree_operations::OperationError;
use worktree_operations::config::ConfigError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to determine current directory")]
    CurrentDir(#[source] std::io::Error),

    #[error("failed to start async runtime")]
    Runtime(#[source] std::io::Error),

    #[error("failed to read patch '{path}'")]
    ReadPatch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode output as JSON")]
    Json(#[from] serde_json::Error),

    #[error("'{command}' works on a single directory, but {count} were given")]
    MultipleDirectories { command: &'static str, count: usize },

    #[error("{action} failed in {failed} of {total} director{}", if *total == 1 { "y" } else { "ies" })]
    PartialFailure {
        action: &'static str,
        failed: usize,
        total: usize,
    },
}

pub type Result<T> = std::result::Result<T, CliError>;
