mod apply;
mod capture;
mod commit;
mod delete;
mod diff;
mod list;
mod restore;
mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Subcommand;
use worktree_operations::checkpoint::{CheckpointId, CheckpointManager};
use worktree_operations::config::WorktreeConfig;
use worktree_operations::context::GitSagaContext;
use worktree_operations::providers::CliGitProvider;

use crate::error::{CliError, Result};
use crate::output::OutputFormat;

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Snapshot every directory under a checkpoint id
    Capture(capture::CaptureArgs),
    /// Summarize changes since a checkpoint
    Diff(diff::DiffArgs),
    /// Reset every directory to a checkpoint
    Restore {
        /// Checkpoint to restore
        id: CheckpointId,
    },
    /// List the checkpoints recorded in each directory
    List,
    /// Remove a checkpoint from every directory
    Delete {
        /// Checkpoint to remove
        id: CheckpointId,
    },
    /// Stage and commit changes, undoing the staging if the commit fails
    Commit(commit::CommitArgs),
    /// Pull then push, keeping local edits safe in a stash
    Sync(sync::SyncArgs),
    /// Apply a patch, reverting it if anything goes wrong
    Apply(apply::ApplyArgs),
}

impl Commands {
    pub(crate) async fn execute(self, env: &CommandEnv) -> Result<()> {
        match self {
            Self::Capture(args) => capture::run(env, args).await,
            Self::Diff(args) => diff::run(env, args).await,
            Self::Restore { id } => restore::run(env, &id).await,
            Self::List => list::run(env).await,
            Self::Delete { id } => delete::run(env, &id).await,
            Self::Commit(args) => commit::run(env, args).await,
            Self::Sync(args) => sync::run(env, args).await,
            Self::Apply(args) => apply::run(env, args).await,
        }
    }
}

/// Everything a command needs from the global options.
pub(crate) struct CommandEnv {
    directories: Vec<PathBuf>,
    config: Arc<WorktreeConfig>,
    git_provider: Arc<CliGitProvider>,
    format: OutputFormat,
}

impl CommandEnv {
    pub(crate) fn new(
        directories: Vec<PathBuf>,
        config: WorktreeConfig,
        format: OutputFormat,
    ) -> Self {
        let git_provider = Arc::new(CliGitProvider::with_program(config.git().program()));
        Self {
            directories,
            config: Arc::new(config),
            git_provider,
            format,
        }
    }

    pub(crate) fn format(&self) -> OutputFormat {
        self.format
    }

    pub(crate) fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    pub(crate) fn manager(&self) -> CheckpointManager<CliGitProvider> {
        CheckpointManager::new(
            Arc::clone(&self.git_provider),
            Arc::clone(&self.config),
            self.directories.iter().cloned(),
        )
    }

    /// Saga context for commands that only make sense in one directory.
    pub(crate) fn single(&self, command: &'static str) -> Result<GitSagaContext<CliGitProvider>> {
        match self.directories.as_slice() {
            [dir] => Ok(self.context(dir)),
            dirs => Err(CliError::MultipleDirectories {
                command,
                count: dirs.len(),
            }),
        }
    }

    fn context(&self, dir: &Path) -> GitSagaContext<CliGitProvider> {
        GitSagaContext::new(
            dir.to_path_buf(),
            Arc::clone(&self.git_provider),
            Arc::clone(&self.config),
        )
    }
}

/// Turns per-directory failures into a non-zero exit after the report has been printed.
pub(crate) fn check_failures(action: &'static str, failed: usize, total: usize) -> Result<()> {
    if failed == 0 {
        Ok(())
    } else {
        Err(CliError::PartialFailure {
            action,
            failed,
            total,
        })
    }
}
