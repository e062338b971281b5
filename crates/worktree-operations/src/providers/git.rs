use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use worktree_git::{ApplyOptions, CommitInfo, Repository, ResetMode, StashEntry, Upstream};

use crate::Result;
use crate::config::DEFAULT_GIT_PROGRAM;
use crate::traits::GitProvider;

/// [`GitProvider`] backed by the `git` executable.
pub struct CliGitProvider {
    program: String,
}

impl CliGitProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::with_program(DEFAULT_GIT_PROGRAM)
    }

    #[must_use]
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn open(&self, root: &Path) -> Result<Repository> {
        Ok(Repository::open(root)?.with_program(&self.program))
    }
}

impl Default for CliGitProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn as_paths(paths: &[PathBuf]) -> Vec<&Path> {
    paths.iter().map(PathBuf::as_path).collect()
}

#[async_trait]
impl GitProvider for CliGitProvider {
    async fn head_sha(&self, root: &Path) -> Result<Option<String>> {
        Ok(self.open(root)?.head_sha()?)
    }

    async fn current_branch(&self, root: &Path) -> Result<Option<String>> {
        Ok(self.open(root)?.current_branch()?)
    }

    async fn upstream(&self, root: &Path) -> Result<Option<Upstream>> {
        Ok(self.open(root)?.upstream()?)
    }

    async fn rev_parse(
        &self,
        root: &Path,
        rev: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(self.open(root)?.rev_parse(rev, cancel).await?)
    }

    async fn has_changes(&self, root: &Path, cancel: &CancellationToken) -> Result<bool> {
        Ok(self.open(root)?.has_changes(cancel).await?)
    }

    async fn staged_files(&self, root: &Path, cancel: &CancellationToken) -> Result<Vec<PathBuf>> {
        Ok(self.open(root)?.staged_files(cancel).await?)
    }

    async fn stage_all(&self, root: &Path, cancel: &CancellationToken) -> Result<()> {
        Ok(self.open(root)?.stage_all(cancel).await?)
    }

    async fn stage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let repo = self.open(root)?;
        Ok(repo.stage_paths(&as_paths(paths), cancel).await?)
    }

    async fn unstage_all(&self, root: &Path, cancel: &CancellationToken) -> Result<()> {
        Ok(self.open(root)?.unstage_all(cancel).await?)
    }

    async fn unstage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Result<()> {
        let repo = self.open(root)?;
        Ok(repo.unstage_paths(&as_paths(paths), cancel).await?)
    }

    async fn commit(
        &self,
        root: &Path,
        message: &str,
        allow_empty: bool,
        cancel: &CancellationToken,
    ) -> Result<CommitInfo> {
        Ok(self.open(root)?.commit(message, allow_empty, cancel).await?)
    }

    async fn reset(
        &self,
        root: &Path,
        mode: ResetMode,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self.open(root)?.reset(mode, target, cancel).await?)
    }

    async fn clean_untracked(&self, root: &Path, cancel: &CancellationToken) -> Result<()> {
        Ok(self.open(root)?.clean_untracked(cancel).await?)
    }

    async fn stash_push(
        &self,
        root: &Path,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self.open(root)?.stash_push(message, true, cancel).await?)
    }

    async fn stash_pop(&self, root: &Path, cancel: &CancellationToken) -> Result<()> {
        Ok(self.open(root)?.stash_pop(cancel).await?)
    }

    async fn stash_list(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<StashEntry>> {
        Ok(self.open(root)?.stash_list(cancel).await?)
    }

    async fn pull(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self.open(root)?.pull(remote, branch, cancel).await?)
    }

    async fn push(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self.open(root)?.push(remote, branch, cancel).await?)
    }

    async fn apply_patch(
        &self,
        root: &Path,
        patch: &Path,
        options: ApplyOptions,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self.open(root)?.apply_patch(patch, options, cancel).await?)
    }

    async fn diff(
        &self,
        root: &Path,
        from: &str,
        to: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(self.open(root)?.diff(from, to, cancel).await?)
    }

    async fn snapshot_tree(&self, root: &Path, cancel: &CancellationToken) -> Result<String> {
        Ok(self.open(root)?.snapshot_tree(cancel).await?)
    }

    async fn commit_tree(
        &self,
        root: &Path,
        tree: &str,
        parent: Option<&str>,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        Ok(self
            .open(root)?
            .commit_tree(tree, parent, message, cancel)
            .await?)
    }

    async fn read_ref(
        &self,
        root: &Path,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        Ok(self.open(root)?.read_ref(name, cancel).await?)
    }

    async fn update_ref(
        &self,
        root: &Path,
        name: &str,
        target: &str,
        expected_old: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        Ok(self
            .open(root)?
            .update_ref(name, target, expected_old, cancel)
            .await?)
    }

    async fn delete_ref(&self, root: &Path, name: &str, cancel: &CancellationToken) -> Result<()> {
        Ok(self.open(root)?.delete_ref(name, cancel).await?)
    }

    async fn list_refs(
        &self,
        root: &Path,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, String)>> {
        Ok(self.open(root)?.list_refs(prefix, cancel).await?)
    }
}
