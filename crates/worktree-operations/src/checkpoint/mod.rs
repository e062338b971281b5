//! Checkpoints of whole working trees.
//!
//! A checkpoint is a commit whose tree is the working tree at capture time, untracked files
//! included, and whose parent is the HEAD it was taken on. It is kept alive by a ref under the
//! configured prefix (`refs/worktree-checkpoints/` by default). Capturing never touches HEAD,
//! the current branch or the index.

mod capture;
mod diff;
mod id;
mod manager;
mod revert;
mod stats;

pub use capture::{
    CaptureCheckpointSaga, CaptureData, Checkpoint, CommitSnapshotStep, ReadHeadStep,
    RecordCheckpointRefStep, SnapshotTreeStep,
};
pub use diff::{DiffCheckpointSaga, DiffData, DiffStep, DiffTarget, ResolveFromStep, ResolveToStep};
pub use id::CheckpointId;
pub use manager::{
    CaptureHandle, CaptureHook, CaptureReport, CheckpointInfo, CheckpointManager, DeleteResult,
    RestoreResult,
};
pub use revert::{ResolveCheckpointStep, RestoreWorktreeStep, RevertCheckpointSaga, RevertData};
pub use stats::DiffStats;

use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

/// Commit recorded for `id` in the context's working directory.
async fn resolve_checkpoint<G>(ctx: &GitSagaContext<G>, id: &CheckpointId) -> Result<String>
where
    G: GitProvider,
{
    let ref_name = id.ref_name(ctx.config().checkpoint().ref_prefix());
    ctx.git_provider()
        .read_ref(ctx.root(), &ref_name, ctx.cancel_token())
        .await?
        .ok_or_else(|| OperationError::CheckpointNotFound {
            id: id.to_string(),
            cwd: ctx.root().to_path_buf(),
        })
}
