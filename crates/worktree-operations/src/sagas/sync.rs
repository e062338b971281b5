use async_trait::async_trait;
use tracing::{debug, warn};
use worktree_git::{GitError, ResetMode, StashEntry};
use worktree_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep, StepKind};

use super::git_step;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

/// Optional overrides for where to sync with. Unset fields fall back to the branch's upstream,
/// then to the configured remote and the current branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRequest {
    pub remote: Option<String>,
    pub branch: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutput {
    pub remote: String,
    pub branch: String,
    pub original_head: String,
    /// Whether local changes were stashed around the pull.
    pub stashed: bool,
    /// A stash with this saga's label left behind by an earlier run. Never popped automatically.
    pub orphaned_stash: Option<StashEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct SyncSagaData {
    pub request: SyncRequest,
    pub remote: String,
    pub local_branch: String,
    pub remote_branch: String,
    pub original_head: String,
    pub has_changes: bool,
    pub stash_count_before: usize,
    pub stash_created: bool,
    pub orphaned_stash: Option<StashEntry>,
}

impl SyncSagaData {
    #[must_use]
    pub fn new(request: SyncRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    fn into_output(self) -> SyncOutput {
        SyncOutput {
            remote: self.remote,
            branch: self.remote_branch,
            original_head: self.original_head,
            stashed: self.stash_created,
            orphaned_stash: self.orphaned_stash,
        }
    }
}

git_step!(
    /// Records the original HEAD, resolves remote and branch, and checks for local changes.
    CaptureSyncStateStep
);

#[async_trait]
impl<G> SagaStep for CaptureSyncStateStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "capture-state"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        let root = ctx.root();

        input.original_head = git.head_sha(root).await?.ok_or(GitError::UnbornHead)?;
        input.local_branch =
            git.current_branch(root)
                .await?
                .ok_or_else(|| OperationError::DetachedHead {
                    cwd: root.to_path_buf(),
                })?;

        let upstream = git.upstream(root).await?;
        input.remote = input
            .request
            .remote
            .clone()
            .or_else(|| upstream.as_ref().map(|u| u.remote.clone()))
            .unwrap_or_else(|| ctx.config().git().remote().to_string());
        input.remote_branch = input
            .request
            .branch
            .clone()
            .or_else(|| upstream.map(|u| u.branch))
            .unwrap_or_else(|| input.local_branch.clone());

        input.has_changes = git.has_changes(root, ctx.cancel_token()).await?;

        debug!(
            cwd = %root.display(),
            head = %input.original_head,
            remote = %input.remote,
            branch = %input.remote_branch,
            dirty = input.has_changes,
            "captured sync state"
        );
        Ok(input)
    }
}

git_step!(
    /// Counts existing stashes and reports one left behind by an earlier failed sync.
    DetectOrphanedStashStep
);

#[async_trait]
impl<G> SagaStep for DetectOrphanedStashStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "detect-orphaned-stash"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        if !input.has_changes {
            return Ok(input);
        }

        let stashes = ctx
            .git_provider()
            .stash_list(ctx.root(), ctx.cancel_token())
            .await?;
        let label = ctx.config().sync().stash_message();

        input.stash_count_before = stashes.len();
        input.orphaned_stash = stashes.into_iter().find(|s| s.has_message(label));

        if let Some(orphan) = &input.orphaned_stash {
            warn!(
                cwd = %ctx.root().display(),
                stash = orphan.index,
                subject = %orphan.subject,
                "found stash left by an earlier sync; leaving it for manual resolution"
            );
        }
        Ok(input)
    }
}

git_step!(
    /// Stashes local changes, untracked files included, when the tree is dirty.
    StashChangesStep
);

#[async_trait]
impl<G> SagaStep for StashChangesStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "stash-changes"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        if !input.has_changes {
            return Ok(input);
        }

        let git = ctx.git_provider();
        git.stash_push(
            ctx.root(),
            ctx.config().sync().stash_message(),
            ctx.cancel_token(),
        )
        .await?;

        // git exits 0 without creating an entry when nothing was stash-worthy
        let after = git.stash_list(ctx.root(), ctx.cancel_token()).await?.len();
        input.stash_created = after > input.stash_count_before;
        debug!(created = input.stash_created, "stashed local changes");
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        if output.stash_created {
            debug!(cwd = %ctx.root().display(), "popping sync stash");
            ctx.git_provider()
                .stash_pop(ctx.root(), ctx.rollback_token())
                .await?;
        }
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "pop the stash created for the sync".to_string()
    }
}

git_step!(
    /// Pulls the resolved remote branch into the current branch.
    PullStep
);

#[async_trait]
impl<G> SagaStep for PullStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "pull"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        let pulled = git
            .pull(
                ctx.root(),
                &input.remote,
                &input.remote_branch,
                ctx.cancel_token(),
            )
            .await;

        if let Err(error) = pulled {
            // A half-applied merge would stop the stash from popping during unwind.
            warn!(%error, "pull failed, resetting to original head");
            if let Err(reset_error) = git
                .reset(
                    ctx.root(),
                    ResetMode::Hard,
                    &input.original_head,
                    ctx.rollback_token(),
                )
                .await
            {
                warn!(error = %reset_error, "reset after failed pull also failed");
            }
            return Err(error);
        }
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        debug!(head = %output.original_head, "resetting to pre-sync head");
        ctx.git_provider()
            .reset(
                ctx.root(),
                ResetMode::Hard,
                &output.original_head,
                ctx.rollback_token(),
            )
            .await
    }

    fn compensation_description(&self) -> String {
        "hard reset to the pre-sync HEAD".to_string()
    }
}

git_step!(
    /// Pushes the current branch to the resolved remote branch.
    PushStep
);

#[async_trait]
impl<G> SagaStep for PushStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "push"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let refspec = format!("HEAD:refs/heads/{}", input.remote_branch);
        ctx.git_provider()
            .push(ctx.root(), &input.remote, &refspec, ctx.cancel_token())
            .await?;
        Ok(input)
    }

    fn compensation_description(&self) -> String {
        "nothing to undo locally for a push".to_string()
    }
}

git_step!(
    /// Pops the stash created before the pull.
    RestoreStashStep
);

#[async_trait]
impl<G> SagaStep for RestoreStashStep<G>
where
    G: GitProvider + 'static,
{
    type Input = SyncSagaData;
    type Output = SyncSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "restore-stash"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        if input.stash_created {
            ctx.git_provider()
                .stash_pop(ctx.root(), ctx.cancel_token())
                .await?;
        }
        Ok(input)
    }

    fn compensation_description(&self) -> String {
        "nothing to undo for a restored stash".to_string()
    }
}

/// Pull and push with local changes protected by a stash.
///
/// On failure the working directory is returned to the pre-sync HEAD with any stashed edits
/// popped back. When a stash cannot be popped it is left in place; the next run reports it in
/// [`SyncOutput::orphaned_stash`].
pub struct SyncSaga;

impl SyncSaga {
    #[must_use]
    pub fn build<G>() -> Saga<SyncSagaData, SyncSagaData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(CaptureSyncStateStep::<G>::new())
            .then(DetectOrphanedStashStep::new())
            .then(StashChangesStep::new())
            .then(PullStep::new())
            .then(PushStep::new())
            .then(RestoreStashStep::new())
            .build()
            .named("sync")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::SagaFailed`] or [`OperationError::SagaCompensationFailed`]
    /// naming the step that failed.
    pub async fn run<G>(ctx: &GitSagaContext<G>, request: SyncRequest) -> Result<SyncOutput>
    where
        G: GitProvider + 'static,
    {
        Self::run_with_audit(ctx, request).await.0
    }

    pub async fn run_with_audit<G>(
        ctx: &GitSagaContext<G>,
        request: SyncRequest,
    ) -> (Result<SyncOutput>, SagaAuditLog)
    where
        G: GitProvider + 'static,
    {
        let saga = Self::build::<G>();
        let (result, audit) = saga
            .execute_with_audit(ctx, SyncSagaData::new(request))
            .await;
        (
            result
                .map(SyncSagaData::into_output)
                .map_err(OperationError::from),
            audit,
        )
    }
}
