use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;
use worktree_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep, StepKind};

use super::CheckpointId;
use crate::context::GitSagaContext;
use crate::sagas::git_step;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

/// A captured checkpoint in one working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub id: CheckpointId,
    pub ref_name: String,
    /// Commit holding the snapshot tree.
    pub commit: String,
    /// HEAD at capture time and parent of `commit`; `None` when the branch had no commits yet.
    pub base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CaptureData {
    pub id: CheckpointId,
    pub ref_name: String,
    pub base: Option<String>,
    pub tree: Option<String>,
    pub commit: Option<String>,
    /// Value the checkpoint ref held before this capture, if it existed.
    pub previous: Option<String>,
}

impl CaptureData {
    #[must_use]
    pub fn new(id: CheckpointId, ref_prefix: &str) -> Self {
        Self {
            ref_name: id.ref_name(ref_prefix),
            id,
            base: None,
            tree: None,
            commit: None,
            previous: None,
        }
    }

    fn into_checkpoint(self) -> Checkpoint {
        Checkpoint {
            id: self.id,
            ref_name: self.ref_name,
            commit: self
                .commit
                .expect("commit-snapshot runs before the saga completes"),
            base: self.base,
        }
    }
}

git_step!(
    /// Records HEAD as the checkpoint's base. An unborn branch has none.
    ReadHeadStep
);

#[async_trait]
impl<G> SagaStep for ReadHeadStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CaptureData;
    type Output = CaptureData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "read-head"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        input.base = ctx.git_provider().head_sha(ctx.root()).await?;
        Ok(input)
    }
}

git_step!(
    /// Writes the working tree, untracked files included, as a tree object.
    SnapshotTreeStep
);

#[async_trait]
impl<G> SagaStep for SnapshotTreeStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CaptureData;
    type Output = CaptureData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "snapshot-tree"
    }

    // Only unreachable objects are written.
    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let tree = ctx
            .git_provider()
            .snapshot_tree(ctx.root(), ctx.cancel_token())
            .await?;
        input.tree = Some(tree);
        Ok(input)
    }
}

git_step!(
    /// Wraps the snapshot tree in a commit on top of the base.
    CommitSnapshotStep
);

#[async_trait]
impl<G> SagaStep for CommitSnapshotStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CaptureData;
    type Output = CaptureData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "commit-snapshot"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let tree = input.tree.as_deref().expect("snapshot-tree runs first");
        let message = format!(
            "{} {}",
            ctx.config().checkpoint().message_prefix(),
            input.id
        );
        let commit = ctx
            .git_provider()
            .commit_tree(
                ctx.root(),
                tree,
                input.base.as_deref(),
                &message,
                ctx.cancel_token(),
            )
            .await?;
        input.commit = Some(commit);
        Ok(input)
    }
}

git_step!(
    /// Points the checkpoint ref at the new commit, guarding against concurrent updates.
    RecordCheckpointRefStep
);

#[async_trait]
impl<G> SagaStep for RecordCheckpointRefStep<G>
where
    G: GitProvider + 'static,
{
    type Input = CaptureData;
    type Output = CaptureData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "record-checkpoint-ref"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let git = ctx.git_provider();
        let commit = input.commit.as_deref().expect("commit-snapshot runs first");

        input.previous = git
            .read_ref(ctx.root(), &input.ref_name, ctx.cancel_token())
            .await?;
        // An empty expected value asserts the ref does not exist yet.
        let expected = input.previous.as_deref().unwrap_or("");
        git.update_ref(
            ctx.root(),
            &input.ref_name,
            commit,
            Some(expected),
            ctx.cancel_token(),
        )
        .await?;

        debug!(
            cwd = %ctx.root().display(),
            checkpoint = %input.id,
            commit,
            replaced = ?input.previous,
            "recorded checkpoint ref"
        );
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        let git = ctx.git_provider();
        match &output.previous {
            Some(previous) => {
                git.update_ref(
                    ctx.root(),
                    &output.ref_name,
                    previous,
                    output.commit.as_deref(),
                    ctx.rollback_token(),
                )
                .await
            }
            None => {
                git.delete_ref(ctx.root(), &output.ref_name, ctx.rollback_token())
                    .await
            }
        }
    }

    fn compensation_description(&self) -> String {
        "restore the previous checkpoint ref".to_string()
    }
}

/// Captures the working tree as a checkpoint without touching HEAD or the index.
pub struct CaptureCheckpointSaga;

impl CaptureCheckpointSaga {
    #[must_use]
    pub fn build<G>() -> Saga<CaptureData, CaptureData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(ReadHeadStep::<G>::new())
            .then(SnapshotTreeStep::new())
            .then(CommitSnapshotStep::new())
            .then(RecordCheckpointRefStep::new())
            .build()
            .named("capture-checkpoint")
    }

    /// # Errors
    ///
    /// Fails at the step whose git call failed. A repository without commits is captured as a
    /// parentless checkpoint.
    pub async fn run<G>(ctx: &GitSagaContext<G>, id: &CheckpointId) -> Result<Checkpoint>
    where
        G: GitProvider + 'static,
    {
        Self::run_with_audit(ctx, id).await.0
    }

    pub async fn run_with_audit<G>(
        ctx: &GitSagaContext<G>,
        id: &CheckpointId,
    ) -> (Result<Checkpoint>, SagaAuditLog)
    where
        G: GitProvider + 'static,
    {
        let data = CaptureData::new(id.clone(), ctx.config().checkpoint().ref_prefix());
        let (result, audit) = Self::build::<G>().execute_with_audit(ctx, data).await;
        (
            result
                .map(CaptureData::into_checkpoint)
                .map_err(OperationError::from),
            audit,
        )
    }
}
