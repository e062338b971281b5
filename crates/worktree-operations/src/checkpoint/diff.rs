use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use worktree_saga::{Saga, SagaBuilder, SagaStep, StepKind};

use super::{CheckpointId, resolve_checkpoint};
use crate::context::GitSagaContext;
use crate::sagas::git_step;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

const CURRENT: &str = "current";

/// Right-hand side of a checkpoint diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DiffTarget {
    /// The live working tree, untracked files included.
    #[default]
    Current,
    Checkpoint(CheckpointId),
}

impl FromStr for DiffTarget {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self> {
        if s == CURRENT {
            Ok(Self::Current)
        } else {
            Ok(Self::Checkpoint(s.parse()?))
        }
    }
}

impl fmt::Display for DiffTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str(CURRENT),
            Self::Checkpoint(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiffData {
    pub from: CheckpointId,
    pub to: DiffTarget,
    pub from_commit: Option<String>,
    /// Commit or tree the diff is taken against.
    pub to_treeish: Option<String>,
    pub diff: Option<String>,
}

impl DiffData {
    #[must_use]
    pub fn new(from: CheckpointId, to: DiffTarget) -> Self {
        Self {
            from,
            to,
            from_commit: None,
            to_treeish: None,
            diff: None,
        }
    }
}

git_step!(ResolveFromStep);

#[async_trait]
impl<G> SagaStep for ResolveFromStep<G>
where
    G: GitProvider + 'static,
{
    type Input = DiffData;
    type Output = DiffData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "resolve-from"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        input.from_commit = Some(resolve_checkpoint(ctx, &input.from).await?);
        Ok(input)
    }
}

git_step!(
    /// Resolves the other checkpoint, or snapshots the live tree for [`DiffTarget::Current`].
    ResolveToStep
);

#[async_trait]
impl<G> SagaStep for ResolveToStep<G>
where
    G: GitProvider + 'static,
{
    type Input = DiffData;
    type Output = DiffData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "resolve-to"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let treeish = match &input.to {
            DiffTarget::Current => {
                ctx.git_provider()
                    .snapshot_tree(ctx.root(), ctx.cancel_token())
                    .await?
            }
            DiffTarget::Checkpoint(id) => resolve_checkpoint(ctx, id).await?,
        };
        input.to_treeish = Some(treeish);
        Ok(input)
    }
}

git_step!(DiffStep);

#[async_trait]
impl<G> SagaStep for DiffStep<G>
where
    G: GitProvider + 'static,
{
    type Input = DiffData;
    type Output = DiffData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "diff"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let from = input.from_commit.as_deref().expect("resolve-from runs first");
        let to = input.to_treeish.as_deref().expect("resolve-to runs first");
        let diff = ctx
            .git_provider()
            .diff(ctx.root(), from, to, ctx.cancel_token())
            .await?;
        input.diff = Some(diff);
        Ok(input)
    }
}

/// Raw unified diff between a checkpoint and another checkpoint or the live tree.
pub struct DiffCheckpointSaga;

impl DiffCheckpointSaga {
    #[must_use]
    pub fn build<G>() -> Saga<DiffData, DiffData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(ResolveFromStep::<G>::new())
            .then(ResolveToStep::new())
            .then(DiffStep::new())
            .build()
            .named("diff-checkpoint")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::CheckpointNotFound`] (wrapped in [`OperationError::SagaFailed`])
    /// if either checkpoint is missing in this directory.
    pub async fn run<G>(
        ctx: &GitSagaContext<G>,
        from: &CheckpointId,
        to: &DiffTarget,
    ) -> Result<String>
    where
        G: GitProvider + 'static,
    {
        Self::build::<G>()
            .execute(ctx, DiffData::new(from.clone(), to.clone()))
            .await
            .map(|data| data.diff.unwrap_or_default())
            .map_err(OperationError::from)
    }
}
