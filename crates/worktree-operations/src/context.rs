use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::WorktreeConfig;
use crate::traits::GitProvider;

/// Dependencies shared by every step of a saga running against one working directory.
pub struct GitSagaContext<G> {
    root: PathBuf,
    git_provider: Arc<G>,
    config: Arc<WorktreeConfig>,
    cancel: CancellationToken,
    rollback: CancellationToken,
}

impl<G> Clone for GitSagaContext<G> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            git_provider: Arc::clone(&self.git_provider),
            config: Arc::clone(&self.config),
            cancel: self.cancel.clone(),
            rollback: self.rollback.clone(),
        }
    }
}

impl<G> GitSagaContext<G>
where
    G: GitProvider,
{
    pub fn new(root: PathBuf, git_provider: Arc<G>, config: Arc<WorktreeConfig>) -> Self {
        Self {
            root,
            git_provider,
            config,
            cancel: CancellationToken::new(),
            rollback: CancellationToken::new(),
        }
    }

    /// Forward actions observe `cancel`; cancelling it fails the running step and unwinds.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn git_provider(&self) -> &G {
        &self.git_provider
    }

    #[must_use]
    pub fn config(&self) -> &WorktreeConfig {
        &self.config
    }

    /// Token for forward actions.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Token for compensations. Never cancelled, so an aborted saga still rolls back.
    #[must_use]
    pub fn rollback_token(&self) -> &CancellationToken {
        &self.rollback
    }
}
