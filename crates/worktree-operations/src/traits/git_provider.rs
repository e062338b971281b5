use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use worktree_git::{ApplyOptions, CommitInfo, ResetMode, StashEntry, Upstream};

use crate::Result;

/// Version-control operations the sagas are composed from, scoped to one working directory per
/// call.
#[async_trait]
pub trait GitProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened.
    async fn head_sha(&self, root: &Path) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened.
    async fn current_branch(&self, root: &Path) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the repository configuration cannot be read.
    async fn upstream(&self, root: &Path) -> Result<Option<Upstream>>;

    /// # Errors
    ///
    /// Returns an error if the revision does not resolve to a commit.
    async fn rev_parse(&self, root: &Path, rev: &str, cancel: &CancellationToken)
    -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the status check fails.
    async fn has_changes(&self, root: &Path, cancel: &CancellationToken) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if the index cannot be read.
    async fn staged_files(&self, root: &Path, cancel: &CancellationToken) -> Result<Vec<PathBuf>>;

    /// # Errors
    ///
    /// Returns an error if staging fails.
    async fn stage_all(&self, root: &Path, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if staging any of the paths fails.
    async fn stage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the index cannot be reset.
    async fn unstage_all(&self, root: &Path, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the index cannot be reset.
    async fn unstage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the commit cannot be created.
    async fn commit(
        &self,
        root: &Path,
        message: &str,
        allow_empty: bool,
        cancel: &CancellationToken,
    ) -> Result<CommitInfo>;

    /// # Errors
    ///
    /// Returns an error if the reset fails.
    async fn reset(
        &self,
        root: &Path,
        mode: ResetMode,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if untracked files cannot be removed.
    async fn clean_untracked(&self, root: &Path, cancel: &CancellationToken) -> Result<()>;

    /// Stashes all changes, untracked files included.
    ///
    /// # Errors
    ///
    /// Returns an error if the stash command fails.
    async fn stash_push(&self, root: &Path, message: &str, cancel: &CancellationToken)
    -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if there is no stash or it does not apply cleanly.
    async fn stash_pop(&self, root: &Path, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the stash list cannot be read.
    async fn stash_list(&self, root: &Path, cancel: &CancellationToken)
    -> Result<Vec<StashEntry>>;

    /// # Errors
    ///
    /// Returns an error if the fetch or merge fails.
    async fn pull(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the remote rejects the push.
    async fn push(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the patch does not apply.
    async fn apply_patch(
        &self,
        root: &Path,
        patch: &Path,
        options: ApplyOptions,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Raw unified diff between two tree-ish revisions.
    ///
    /// # Errors
    ///
    /// Returns an error if either side cannot be resolved.
    async fn diff(
        &self,
        root: &Path,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// Tree object of the live working tree, untracked files included.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    async fn snapshot_tree(&self, root: &Path, cancel: &CancellationToken) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the commit object cannot be written.
    async fn commit_tree(
        &self,
        root: &Path,
        tree: &str,
        parent: Option<&str>,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// # Errors
    ///
    /// Returns an error if the ref cannot be read.
    async fn read_ref(
        &self,
        root: &Path,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>>;

    /// # Errors
    ///
    /// Returns an error if the ref cannot be updated or does not hold `expected_old`.
    async fn update_ref(
        &self,
        root: &Path,
        name: &str,
        target: &str,
        expected_old: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the ref cannot be deleted.
    async fn delete_ref(&self, root: &Path, name: &str, cancel: &CancellationToken) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if the refs cannot be listed.
    async fn list_refs(
        &self,
        root: &Path,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, String)>>;
}
