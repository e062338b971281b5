use std::path::PathBuf;

use thiserror::Error;
use worktree_saga::SagaError;

use crate::config::ConfigError;

/// Details about a failed compensation during saga rollback.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The error that occurred during compensation.
    pub error: Box<OperationError>,
}

#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Git(#[from] worktree_git::GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid checkpoint id '{id}': {reason}")]
    InvalidCheckpointId { id: String, reason: &'static str },

    #[error("checkpoint '{id}' not found in '{cwd}'")]
    CheckpointNotFound { id: String, cwd: PathBuf },

    #[error("HEAD is detached in '{cwd}'; sync needs a branch")]
    DetachedHead { cwd: PathBuf },

    #[error("no paths given to stage")]
    NoPathsGiven,

    #[error("failed to write temporary patch file")]
    PatchFileWrite(#[source] std::io::Error),

    #[error("capture task for '{cwd}' did not finish")]
    CaptureTask {
        cwd: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },

    #[error("saga failed at step '{step}'")]
    SagaFailed {
        step: String,
        #[source]
        source: Box<OperationError>,
    },

    #[error(
        "saga failed at step '{step}' and {} compensation(s) also failed", compensation_failures.len()
    )]
    SagaCompensationFailed {
        step: String,
        source: Box<OperationError>,
        compensation_failures: Vec<CompensationFailure>,
    },
}

pub type Result<T> = std::result::Result<T, OperationError>;

impl OperationError {
    /// Name of the saga step that failed, if this error came out of a saga.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::SagaFailed { step, .. } | Self::SagaCompensationFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// The error that started it all, with saga wrapping removed.
    #[must_use]
    pub fn root_cause(&self) -> &OperationError {
        match self {
            Self::SagaFailed { source, .. } | Self::SagaCompensationFailed { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }
}

impl From<SagaError<OperationError>> for OperationError {
    fn from(err: SagaError<OperationError>) -> Self {
        match err {
            SagaError::StepFailed { step, source } => Self::SagaFailed {
                step,
                source: Box::new(source),
            },
            SagaError::CompensationFailed {
                failed_step,
                step_error,
                compensation_errors,
            } => {
                let compensation_failures = compensation_errors
                    .into_iter()
                    .map(|e| CompensationFailure {
                        step: e.step,
                        description: e.description,
                        error: Box::new(e.error),
                    })
                    .collect();
                Self::SagaCompensationFailed {
                    step: failed_step,
                    source: Box::new(step_error),
                    compensation_failures,
                }
            }
            _ => Self::SagaFailed {
                step: "unknown".to_string(),
                source: Box::new(Self::Cancelled),
            },
        }
    }
}
