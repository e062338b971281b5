use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;
use worktree_git::ResetMode;
use worktree_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep, StepKind};

use super::git_step;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    /// Paths to stage. `None` stages every change in the working tree.
    pub paths: Option<Vec<PathBuf>>,
    pub allow_empty: bool,
}

impl CommitRequest {
    #[must_use]
    pub fn all(message: &str) -> Self {
        Self {
            message: message.to_string(),
            paths: None,
            allow_empty: false,
        }
    }

    #[must_use]
    pub fn paths(message: &str, paths: Vec<PathBuf>) -> Self {
        Self {
            message: message.to_string(),
            paths: Some(paths),
            allow_empty: false,
        }
    }

    #[must_use]
    pub fn allow_empty(mut self, allow_empty: bool) -> Self {
        self.allow_empty = allow_empty;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitOutput {
    pub commit_sha: String,
    pub branch: Option<String>,
}

/// State threaded through the commit and stage-and-commit sagas.
#[derive(Debug, Clone)]
pub struct CommitSagaData {
    pub request: CommitRequest,
    /// HEAD before anything was staged; `None` on an unborn branch.
    pub original_head: Option<String>,
    pub branch: Option<String>,
    pub previously_staged: Vec<PathBuf>,
    pub commit_sha: Option<String>,
}

impl CommitSagaData {
    #[must_use]
    pub fn new(request: CommitRequest) -> Self {
        Self {
            request,
            original_head: None,
            branch: None,
            previously_staged: Vec::new(),
            commit_sha: None,
        }
    }

    pub(crate) fn into_output(self) -> CommitOutput {
        CommitOutput {
            commit_sha: self
                .commit_sha
                .expect("commit step records the new sha before the saga completes"),
            branch: self.branch,
        }
    }
}

git_step!(
    /// Records HEAD and the current branch so the commit can be undone.
    CaptureHeadStep
);

#[async_trait]
impl<G> SagaStep for CaptureHeadStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CommitSagaData;
    type Output = CommitSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "capture-head"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        input.original_head = ctx.git_provider().head_sha(ctx.root()).await?;
        input.branch = ctx.git_provider().current_branch(ctx.root()).await?;
        debug!(
            cwd = %ctx.root().display(),
            head = ?input.original_head,
            branch = ?input.branch,
            "captured original head"
        );
        Ok(input)
    }
}

git_step!(
    /// Remembers which paths were already staged before this saga touched the index.
    RecordStagedFilesStep
);

#[async_trait]
impl<G> SagaStep for RecordStagedFilesStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CommitSagaData;
    type Output = CommitSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "record-staged-files"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        input.previously_staged = ctx
            .git_provider()
            .staged_files(ctx.root(), ctx.cancel_token())
            .await?;
        Ok(input)
    }
}

git_step!(
    /// Stages the requested paths, or everything.
    StageFilesStep
);

#[async_trait]
impl<G> SagaStep for StageFilesStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CommitSagaData;
    type Output = CommitSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "stage-files"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        match &input.request.paths {
            Some(paths) => {
                git.stage_paths(ctx.root(), paths, ctx.cancel_token())
                    .await?;
            }
            None => git.stage_all(ctx.root(), ctx.cancel_token()).await?,
        }
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        debug!(
            restaged = output.previously_staged.len(),
            "unstaging and restoring previously staged files"
        );
        let git = ctx.git_provider();
        git.unstage_all(ctx.root(), ctx.rollback_token()).await?;
        if !output.previously_staged.is_empty() {
            git.stage_paths(ctx.root(), &output.previously_staged, ctx.rollback_token())
                .await?;
        }
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "unstage changes and restore the previously staged set".to_string()
    }
}

git_step!(
    /// Creates the commit from the staged index.
    CommitStep
);

#[async_trait]
impl<G> SagaStep for CommitStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CommitSagaData;
    type Output = CommitSagaData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "commit"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let info = ctx
            .git_provider()
            .commit(
                ctx.root(),
                &input.request.message,
                input.request.allow_empty,
                ctx.cancel_token(),
            )
            .await?;
        debug!(sha = %info.sha, "created commit");
        input.commit_sha = Some(info.sha);
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        let git = ctx.git_provider();
        match &output.original_head {
            Some(head) => {
                debug!(head = %head, "resetting to original head");
                git.reset(ctx.root(), ResetMode::Soft, head, ctx.rollback_token())
                    .await
            }
            // Deleting HEAD's target returns the branch to its unborn state.
            None => git.delete_ref(ctx.root(), "HEAD", ctx.rollback_token()).await,
        }
    }

    fn compensation_description(&self) -> String {
        "soft reset to the original HEAD".to_string()
    }
}

/// Stages changes and commits them; rolls the index and HEAD back on failure.
pub struct CommitSaga;

impl CommitSaga {
    #[must_use]
    pub fn build<G>() -> Saga<CommitSagaData, CommitSagaData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(CaptureHeadStep::<G>::new())
            .then(RecordStagedFilesStep::new())
            .then(StageFilesStep::new())
            .then(CommitStep::new())
            .build()
            .named("commit")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::SagaFailed`] or [`OperationError::SagaCompensationFailed`]
    /// naming the step that failed.
    pub async fn run<G>(ctx: &GitSagaContext<G>, request: CommitRequest) -> Result<CommitOutput>
    where
        G: GitProvider + 'static,
    {
        Self::run_with_audit(ctx, request).await.0
    }

    pub async fn run_with_audit<G>(
        ctx: &GitSagaContext<G>,
        request: CommitRequest,
    ) -> (Result<CommitOutput>, SagaAuditLog)
    where
        G: GitProvider + 'static,
    {
        let saga = Self::build::<G>();
        let (result, audit) = saga
            .execute_with_audit(ctx, CommitSagaData::new(request))
            .await;
        let result = result
            .map(CommitSagaData::into_output)
            .map_err(OperationError::from);
        (result, audit)
    }
}
