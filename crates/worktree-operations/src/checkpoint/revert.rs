use std::path::Path;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use worktree_git::{GitError, ResetMode};
use worktree_saga::{Saga, SagaBuilder, SagaStep, StepKind};

use super::{Checkpoint, CheckpointId, resolve_checkpoint};
use crate::context::GitSagaContext;
use crate::sagas::git_step;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

#[derive(Debug, Clone)]
pub struct RevertData {
    pub id: CheckpointId,
    pub commit: Option<String>,
    pub base: Option<String>,
}

impl RevertData {
    #[must_use]
    pub fn new(id: CheckpointId) -> Self {
        Self {
            id,
            commit: None,
            base: None,
        }
    }
}

git_step!(
    /// Looks up the checkpoint commit and the HEAD it was captured on. A checkpoint taken before
    /// the first commit has no base.
    ResolveCheckpointStep
);

#[async_trait]
impl<G> SagaStep for ResolveCheckpointStep<G>
where
    G: GitProvider + 'static,
{
    type Input = RevertData;
    type Output = RevertData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "resolve-checkpoint"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let commit = resolve_checkpoint(ctx, &input.id).await?;
        // the checkpoint commit exists, so an unresolvable parent means it has none
        let base = match ctx
            .git_provider()
            .rev_parse(ctx.root(), &format!("{commit}^"), ctx.cancel_token())
            .await
        {
            Ok(base) => Some(base),
            Err(OperationError::Git(GitError::RefNotFound { .. })) => None,
            Err(e) => return Err(e),
        };
        input.commit = Some(commit);
        input.base = base;
        Ok(input)
    }
}

/// Moves HEAD and the index off the checkpoint commit, leaving the working tree alone.
///
/// With no base the branch goes back to unborn and every file becomes untracked.
async fn return_to_base<G: GitProvider>(
    git: &G,
    root: &Path,
    base: Option<&str>,
    cancel: &CancellationToken,
) -> Result<()> {
    match base {
        Some(base) => git.reset(root, ResetMode::Mixed, base, cancel).await,
        None => {
            if git.current_branch(root).await?.is_some() {
                git.delete_ref(root, "HEAD", cancel).await?;
            } else {
                warn!(cwd = %root.display(), "HEAD is detached; leaving it on the checkpoint");
            }
            git.unstage_all(root, cancel).await
        }
    }
}

git_step!(
    /// Makes the working tree match the checkpoint, then moves HEAD and the index back to the
    /// checkpoint's base so the restored edits show up as uncommitted changes.
    RestoreWorktreeStep
);

#[async_trait]
impl<G> SagaStep for RestoreWorktreeStep<G>
where
    G: GitProvider + 'static,
{
    type Input = RevertData;
    type Output = RevertData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "restore-worktree"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        let root = ctx.root();
        let cancel = ctx.cancel_token();
        let commit = input.commit.as_deref().expect("resolve-checkpoint runs first");
        let base = input.base.as_deref();

        git.reset(root, ResetMode::Hard, commit, cancel).await?;

        let restored = async {
            git.clean_untracked(root, cancel).await?;
            return_to_base(git, root, base, cancel).await
        }
        .await;

        if let Err(e) = restored {
            warn!(
                cwd = %root.display(),
                checkpoint = %input.id,
                error = %e,
                "restore failed; moving HEAD back to the checkpoint base"
            );
            if let Err(rollback) = return_to_base(git, root, base, ctx.rollback_token()).await {
                warn!(
                    cwd = %root.display(),
                    error = %rollback,
                    "could not move HEAD back to the checkpoint base"
                );
            }
            return Err(e);
        }

        info!(cwd = %root.display(), checkpoint = %input.id, "restored checkpoint");
        Ok(input)
    }

    fn compensation_description(&self) -> String {
        "none; a failed restore moves HEAD back to the checkpoint base itself".to_string()
    }
}

/// Resets a working directory to a checkpoint. The restore is the last step, so its failure
/// surfaces directly without compensation once HEAD is back on the base.
pub struct RevertCheckpointSaga;

impl RevertCheckpointSaga {
    #[must_use]
    pub fn build<G>() -> Saga<RevertData, RevertData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(ResolveCheckpointStep::<G>::new())
            .then(RestoreWorktreeStep::new())
            .build()
            .named("revert-checkpoint")
    }

    /// # Errors
    ///
    /// Fails at `resolve-checkpoint` if the checkpoint does not exist here, or at
    /// `restore-worktree` if git cannot reset or clean the tree.
    pub async fn run<G>(ctx: &GitSagaContext<G>, id: &CheckpointId) -> Result<Checkpoint>
    where
        G: GitProvider + 'static,
    {
        let prefix = ctx.config().checkpoint().ref_prefix();
        Self::build::<G>()
            .execute(ctx, RevertData::new(id.clone()))
            .await
            .map(|data| Checkpoint {
                ref_name: data.id.ref_name(prefix),
                id: data.id,
                commit: data.commit.unwrap_or_default(),
                base: data.base,
            })
            .map_err(OperationError::from)
    }
}
