use async_trait::async_trait;
use tracing::debug;
use worktree_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep};

use super::commit::{CaptureHeadStep, CommitOutput, CommitRequest, CommitSagaData, CommitStep};
use super::git_step;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

git_step!(
    /// Stages an explicit list of paths; undone by unstaging exactly those paths.
    StagePathsStep
);

#[async_trait]
impl<G> SagaStep for StagePathsStep<G>
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
        let paths = input
            .request
            .paths
            .as_deref()
            .filter(|paths| !paths.is_empty())
            .ok_or(OperationError::NoPathsGiven)?;
        ctx.git_provider()
            .stage_paths(ctx.root(), paths, ctx.cancel_token())
            .await?;
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        let paths = output.request.paths.unwrap_or_default();
        debug!(count = paths.len(), "unstaging paths");
        ctx.git_provider()
            .unstage_paths(ctx.root(), &paths, ctx.rollback_token())
            .await
    }

    fn compensation_description(&self) -> String {
        "unstage the requested paths".to_string()
    }
}

/// Stages exactly the given paths and commits them.
pub struct StageAndCommitSaga;

impl StageAndCommitSaga {
    #[must_use]
    pub fn build<G>() -> Saga<CommitSagaData, CommitSagaData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(CaptureHeadStep::<G>::new())
            .then(StagePathsStep::new())
            .then(CommitStep::new())
            .build()
            .named("stage-and-commit")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::SagaFailed`] naming the failed step; an empty path list fails
    /// at `stage-files` with [`OperationError::NoPathsGiven`].
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
        (
            result
                .map(CommitSagaData::into_output)
                .map_err(OperationError::from),
            audit,
        )
    }
}
