use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempPath;
use tracing::{debug, warn};
use worktree_git::ApplyOptions;
use worktree_saga::{Saga, SagaAuditLog, SagaBuilder, SagaStep};

use super::git_step;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyPatchRequest {
    /// Unified diff text as produced by `git diff`.
    pub patch: String,
    /// Apply to the index only, leaving the working tree alone.
    pub cached: bool,
}

impl ApplyPatchRequest {
    #[must_use]
    pub fn new(patch: impl Into<String>) -> Self {
        Self {
            patch: patch.into(),
            cached: false,
        }
    }

    #[must_use]
    pub fn cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyPatchOutput {
    pub cached: bool,
}

/// State threaded through the apply-patch saga.
///
/// The temporary patch file is deleted when the last clone of `patch_file` drops, which happens
/// once the saga returns on both the success and the unwind path.
#[derive(Debug, Clone)]
pub struct ApplyPatchData {
    pub request: ApplyPatchRequest,
    pub patch_file: Option<Arc<TempPath>>,
}

impl ApplyPatchData {
    #[must_use]
    pub fn new(request: ApplyPatchRequest) -> Self {
        Self {
            request,
            patch_file: None,
        }
    }

    fn patch_path(&self) -> Result<&Path> {
        self.patch_file
            .as_deref()
            .map(|path| &**path)
            .ok_or_else(|| {
                OperationError::PatchFileWrite(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "patch file was not written",
                ))
            })
    }
}

git_step!(
    /// Writes the patch text to a temporary file for `git apply`.
    WritePatchFileStep
);

#[async_trait]
impl<G> SagaStep for WritePatchFileStep<G>
where
    G: GitProvider + 'static,
{
    type Input = ApplyPatchData;
    type Output = ApplyPatchData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "write-patch-file"
    }

    async fn execute(
        &self,
        _ctx: &Self::Context,
        mut input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let mut file = tempfile::Builder::new()
            .prefix("worktree-patch-")
            .suffix(".diff")
            .tempfile()
            .map_err(OperationError::PatchFileWrite)?;
        file.write_all(input.request.patch.as_bytes())
            .and_then(|()| file.flush())
            .map_err(OperationError::PatchFileWrite)?;

        let path = file.into_temp_path();
        debug!(path = %path.display(), bytes = input.request.patch.len(), "wrote patch file");
        input.patch_file = Some(Arc::new(path));
        Ok(input)
    }

    async fn compensate(
        &self,
        _ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        let Some(path) = output.patch_file else {
            return Ok(());
        };
        // TempPath tolerates the file being gone when it drops.
        match tokio::fs::remove_file(&**path).await {
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => {
                Err(OperationError::PatchFileWrite(error))
            }
            _ => Ok(()),
        }
    }

    fn compensation_description(&self) -> String {
        "remove the temporary patch file".to_string()
    }
}

git_step!(
    /// Applies the patch file; undone by applying it in reverse.
    ApplyPatchStep
);

#[async_trait]
impl<G> SagaStep for ApplyPatchStep<G>
where
    G: GitProvider + 'static,
{
    type Input = ApplyPatchData;
    type Output = ApplyPatchData;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        "apply-patch"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        let options = ApplyOptions {
            cached: input.request.cached,
            reverse: false,
        };
        ctx.git_provider()
            .apply_patch(ctx.root(), input.patch_path()?, options, ctx.cancel_token())
            .await?;
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> std::result::Result<(), Self::Error> {
        let options = ApplyOptions {
            cached: output.request.cached,
            reverse: false,
        }
        .reversed();
        let result = ctx
            .git_provider()
            .apply_patch(ctx.root(), output.patch_path()?, options, ctx.rollback_token())
            .await;
        if let Err(error) = &result {
            warn!(
                cwd = %ctx.root().display(),
                %error,
                "reverse apply failed; tree may be partially patched"
            );
        }
        result
    }

    fn compensation_description(&self) -> String {
        "apply the same patch in reverse".to_string()
    }
}

/// Applies a unified diff, reverse-applying it if a later step fails.
///
/// Not idempotent: applying an already-applied patch fails in `apply-patch`.
pub struct ApplyPatchSaga;

impl ApplyPatchSaga {
    #[must_use]
    pub fn build<G>() -> Saga<ApplyPatchData, ApplyPatchData, GitSagaContext<G>, OperationError>
    where
        G: GitProvider + 'static,
    {
        SagaBuilder::new()
            .first_step(WritePatchFileStep::<G>::new())
            .then(ApplyPatchStep::new())
            .build()
            .named("apply-patch")
    }

    /// # Errors
    ///
    /// Returns [`OperationError::SagaFailed`] naming the failed step. A failed reverse apply is
    /// reported alongside the original failure, never instead of it.
    pub async fn run<G>(
        ctx: &GitSagaContext<G>,
        request: ApplyPatchRequest,
    ) -> Result<ApplyPatchOutput>
    where
        G: GitProvider + 'static,
    {
        Self::run_with_audit(ctx, request).await.0
    }

    pub async fn run_with_audit<G>(
        ctx: &GitSagaContext<G>,
        request: ApplyPatchRequest,
    ) -> (Result<ApplyPatchOutput>, SagaAuditLog)
    where
        G: GitProvider + 'static,
    {
        let saga = Self::build::<G>();
        let (result, audit) = saga
            .execute_with_audit(ctx, ApplyPatchData::new(request))
            .await;
        let result = result
            .map(|data| ApplyPatchOutput {
                cached: data.request.cached,
            })
            .map_err(OperationError::from);
        (result, audit)
    }
}
