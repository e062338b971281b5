use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use super::{
    CaptureCheckpointSaga, Checkpoint, CheckpointId, DiffCheckpointSaga, DiffStats, DiffTarget,
    RevertCheckpointSaga,
};
use crate::config::WorktreeConfig;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

/// Called once per directory when a background capture finishes.
pub type CaptureHook = Arc<dyn Fn(&CaptureReport) + Send + Sync>;

/// Outcome of capturing one directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureReport {
    pub cwd: PathBuf,
    pub checkpoint: Option<Checkpoint>,
    pub error: Option<String>,
}

impl CaptureReport {
    #[must_use]
    pub fn success(&self) -> bool {
        self.checkpoint.is_some()
    }

    fn from_result(cwd: PathBuf, result: Result<Checkpoint>) -> Self {
        match result {
            Ok(checkpoint) => Self {
                cwd,
                checkpoint: Some(checkpoint),
                error: None,
            },
            Err(err) => Self {
                cwd,
                checkpoint: None,
                error: Some(error_chain(&err)),
            },
        }
    }
}

/// Per-directory outcome of a restore or delete. One directory failing never affects another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestoreResult {
    pub cwd: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

pub type DeleteResult = RestoreResult;

impl RestoreResult {
    fn from_result<T>(cwd: PathBuf, result: Result<T>) -> Self {
        match result {
            Ok(_) => Self {
                cwd,
                success: true,
                error: None,
            },
            Err(err) => Self {
                cwd,
                success: false,
                error: Some(error_chain(&err)),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointInfo {
    pub id: CheckpointId,
    pub commit: String,
}

/// Background capture of one directory.
#[derive(Debug)]
pub struct CaptureHandle {
    cwd: PathBuf,
    handle: JoinHandle<CaptureReport>,
}

impl CaptureHandle {
    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the capture. A panicked or aborted task is reported as a failed capture.
    pub async fn wait(self) -> CaptureReport {
        match self.handle.await {
            Ok(report) => report,
            Err(source) => CaptureReport::from_result(
                self.cwd.clone(),
                Err(OperationError::CaptureTask {
                    cwd: self.cwd,
                    source,
                }),
            ),
        }
    }
}

/// Fans checkpoint sagas out over every working directory of a task.
///
/// Directories are independent: each saga runs against its own directory, and one directory's
/// failure is reported in its own result without stopping or undoing work elsewhere.
pub struct CheckpointManager<G> {
    git_provider: Arc<G>,
    config: Arc<WorktreeConfig>,
    directories: Mutex<Vec<PathBuf>>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    on_capture: Option<CaptureHook>,
}

impl<G> CheckpointManager<G>
where
    G: GitProvider + 'static,
{
    pub fn new(
        git_provider: Arc<G>,
        config: Arc<WorktreeConfig>,
        directories: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        let manager = Self {
            git_provider,
            config,
            directories: Mutex::new(Vec::new()),
            tracker: TaskTracker::new(),
            cancel: CancellationToken::new(),
            on_capture: None,
        };
        for dir in directories {
            manager.track(dir);
        }
        manager
    }

    #[must_use]
    pub fn with_capture_hook(mut self, hook: CaptureHook) -> Self {
        self.on_capture = Some(hook);
        self
    }

    /// Returns `false` if the directory was already tracked.
    pub fn track(&self, dir: PathBuf) -> bool {
        let mut dirs = self.lock_directories();
        if dirs.contains(&dir) {
            return false;
        }
        dirs.push(dir);
        true
    }

    pub fn untrack(&self, dir: &Path) -> bool {
        let mut dirs = self.lock_directories();
        let before = dirs.len();
        dirs.retain(|d| d != dir);
        dirs.len() != before
    }

    #[must_use]
    pub fn directories(&self) -> Vec<PathBuf> {
        self.lock_directories().clone()
    }

    fn lock_directories(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.directories
            .lock()
            .expect("directory list lock poisoned")
    }

    fn context(&self, dir: PathBuf) -> GitSagaContext<G> {
        GitSagaContext::new(
            dir,
            Arc::clone(&self.git_provider),
            Arc::clone(&self.config),
        )
        .with_cancellation(self.cancel.child_token())
    }

    /// Starts a capture in every tracked directory and returns without waiting.
    ///
    /// Failures are logged and passed to the capture hook; they never reach the caller. Capture
    /// only writes objects and a ref, so it can overlap other work on the same directory.
    pub fn capture(&self, id: &CheckpointId) -> Vec<CaptureHandle> {
        self.directories()
            .into_iter()
            .map(|cwd| {
                let ctx = self.context(cwd.clone());
                let id = id.clone();
                let hook = self.on_capture.clone();
                let task_cwd = cwd.clone();
                let handle = self.tracker.spawn(async move {
                    let result = CaptureCheckpointSaga::run(&ctx, &id).await;
                    let report = CaptureReport::from_result(task_cwd, result);
                    match &report.error {
                        None => info!(
                            cwd = %report.cwd.display(),
                            checkpoint = %id,
                            "captured checkpoint"
                        ),
                        Some(error) => warn!(
                            cwd = %report.cwd.display(),
                            checkpoint = %id,
                            %error,
                            "checkpoint capture failed"
                        ),
                    }
                    if let Some(hook) = hook {
                        hook(&report);
                    }
                    report
                });
                CaptureHandle { cwd, handle }
            })
            .collect()
    }

    /// Captures every tracked directory and waits for all of them.
    pub async fn capture_and_wait(&self, id: &CheckpointId) -> Vec<CaptureReport> {
        join_all(self.capture(id).into_iter().map(CaptureHandle::wait)).await
    }

    /// Reverts every tracked directory to `id`, concurrently, one result per directory.
    pub async fn restore(&self, id: &CheckpointId) -> Vec<RestoreResult> {
        let runs = self.directories().into_iter().map(|cwd| async move {
            let ctx = self.context(cwd.clone());
            let result = RevertCheckpointSaga::run(&ctx, id).await;
            if let Err(err) = &result {
                warn!(cwd = %cwd.display(), checkpoint = %id, error = %err, "restore failed");
            }
            RestoreResult::from_result(cwd, result)
        });
        join_all(runs).await
    }

    /// Line and file counts between `id` and the live tree, summed over all directories.
    pub async fn diff(&self, id: &CheckpointId) -> DiffStats {
        self.diff_to(id, &DiffTarget::Current).await
    }

    /// Like [`diff`](Self::diff) against any target. Directories whose diff fails are logged and
    /// contribute nothing.
    pub async fn diff_to(&self, id: &CheckpointId, to: &DiffTarget) -> DiffStats {
        let runs = self.directories().into_iter().map(|cwd| async move {
            let ctx = self.context(cwd.clone());
            match DiffCheckpointSaga::run(&ctx, id, to).await {
                Ok(diff) => DiffStats::parse(&diff),
                Err(err) => {
                    warn!(cwd = %cwd.display(), checkpoint = %id, error = %err, "diff failed");
                    DiffStats::default()
                }
            }
        });

        let mut total = DiffStats::default();
        total.extend(join_all(runs).await);
        total
    }

    /// Checkpoints recorded in `dir`, sorted by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the refs of `dir` cannot be listed.
    pub async fn list(&self, dir: &Path) -> Result<Vec<CheckpointInfo>> {
        let prefix = self.config.checkpoint().ref_prefix();
        let refs = self
            .git_provider
            .list_refs(dir, prefix, &self.cancel)
            .await?;
        Ok(refs
            .into_iter()
            .filter_map(|(name, commit)| {
                CheckpointId::from_ref_name(&name, prefix).map(|id| CheckpointInfo { id, commit })
            })
            .collect())
    }

    /// Removes the checkpoint ref from every tracked directory.
    pub async fn delete(&self, id: &CheckpointId) -> Vec<DeleteResult> {
        let ref_name = id.ref_name(self.config.checkpoint().ref_prefix());
        let runs = self.directories().into_iter().map(|cwd| {
            let ref_name = &ref_name;
            async move {
                let result = self.delete_in(&cwd, id, ref_name).await;
                if let Err(err) = &result {
                    warn!(cwd = %cwd.display(), checkpoint = %id, error = %err, "delete failed");
                }
                DeleteResult::from_result(cwd, result)
            }
        });
        join_all(runs).await
    }

    async fn delete_in(&self, dir: &Path, id: &CheckpointId, ref_name: &str) -> Result<()> {
        let git = &self.git_provider;
        if git.read_ref(dir, ref_name, &self.cancel).await?.is_none() {
            return Err(OperationError::CheckpointNotFound {
                id: id.to_string(),
                cwd: dir.to_path_buf(),
            });
        }
        git.delete_ref(dir, ref_name, &self.cancel).await
    }

    /// Number of background captures still running.
    #[must_use]
    pub fn pending_captures(&self) -> usize {
        self.tracker.len()
    }

    /// Cancels running sagas. Forward steps fail with a cancellation error and unwind; later
    /// operations on this manager are cancelled immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Stops accepting captures and waits for the ones already running.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

fn error_chain(err: &OperationError) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
