use tokio_util::sync::CancellationToken;

use crate::types::CommitInfo;
use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Commits the staged index and returns the new HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is staged (unless `allow_empty`) or `git commit` fails.
    pub async fn commit(
        &self,
        message: &str,
        allow_empty: bool,
        cancel: &CancellationToken,
    ) -> Result<CommitInfo> {
        let mut command = self.command().args(["commit", "-q", "-m", message]);
        if allow_empty {
            command = command.arg("--allow-empty");
        }
        command.run(self.root(), cancel).await?;

        let sha = self.head_sha()?.ok_or(GitError::UnbornHead)?;
        Ok(CommitInfo {
            sha,
            message: message.to_string(),
        })
    }

    /// Creates a commit object for `tree` without moving any ref.
    ///
    /// # Errors
    ///
    /// Returns an error if `git commit-tree` fails.
    pub async fn commit_tree(
        &self,
        tree: &str,
        parent: Option<&str>,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let mut command = self.command().args(["commit-tree", tree, "-m", message]);
        if let Some(parent) = parent {
            command = command.args(["-p", parent]);
        }
        let out = command.run(self.root(), cancel).await?;
        Ok(out.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::setup_test_repo;
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn commit_staged_file() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        let before = repo.head_sha()?;

        fs::write(dir.path().join("file.txt"), "content")?;
        repo.stage_all(&cancel).await?;
        let info = repo.commit("Add file", false, &cancel).await?;

        assert_eq!(info.message, "Add file");
        assert_eq!(Some(info.sha.clone()), repo.head_sha()?);
        assert_ne!(Some(info.sha), before);
        Ok(())
    }

    #[tokio::test]
    async fn commit_with_nothing_staged_fails() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;

        let result = repo.commit("Nothing", false, &CancellationToken::new()).await;

        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn allow_empty_commit() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let before = repo.head_sha()?;

        let info = repo.commit("Empty", true, &CancellationToken::new()).await?;

        assert_ne!(Some(info.sha), before);
        Ok(())
    }

    #[tokio::test]
    async fn commit_tree_does_not_move_head() -> anyhow::Result<()> {
        let (_dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        let head = repo.head_sha()?.expect("HEAD should exist");
        let tree = repo
            .git(["rev-parse", "HEAD^{tree}"], &cancel)
            .await?
            .trim()
            .to_string();

        let commit = repo
            .commit_tree(&tree, Some(&head), "snapshot", &cancel)
            .await?;

        assert_ne!(commit, head);
        assert_eq!(repo.head_sha()?, Some(head));
        Ok(())
    }
}
