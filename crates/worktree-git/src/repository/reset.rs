use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::types::ResetMode;

use super::Repository;

impl Repository {
    /// # Errors
    ///
    /// Returns an error if `git reset` fails.
    pub async fn reset(
        &self,
        mode: ResetMode,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.git(["reset", "-q", mode.flag(), target], cancel).await?;
        Ok(())
    }

    /// Removes untracked files and directories. Ignored files are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if `git clean` fails.
    pub async fn clean_untracked(&self, cancel: &CancellationToken) -> Result<()> {
        self.git(["clean", "-q", "-f", "-d"], cancel).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{commit_file, setup_test_repo};
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn soft_reset_keeps_changes_staged() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        let base = repo.head_sha()?.expect("HEAD should exist");
        commit_file(&dir, &repo, "file.txt", "content\n").await?;

        repo.reset(ResetMode::Soft, &base, &cancel).await?;

        assert_eq!(repo.head_sha()?, Some(base));
        assert_eq!(repo.staged_files(&cancel).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn hard_reset_restores_content() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        let sha = commit_file(&dir, &repo, "file.txt", "original\n").await?;

        fs::write(dir.path().join("file.txt"), "changed\n")?;
        repo.reset(ResetMode::Hard, &sha, &cancel).await?;

        assert_eq!(fs::read_to_string(dir.path().join("file.txt"))?, "original\n");
        Ok(())
    }

    #[tokio::test]
    async fn clean_removes_untracked_only() -> anyhow::Result<()> {
        let (dir, repo) = setup_test_repo()?;
        let cancel = CancellationToken::new();
        commit_file(&dir, &repo, "tracked.txt", "keep\n").await?;

        fs::create_dir(dir.path().join("scratch"))?;
        fs::write(dir.path().join("scratch").join("tmp.txt"), "tmp")?;
        fs::write(dir.path().join("loose.txt"), "loose")?;

        repo.clean_untracked(&cancel).await?;

        assert!(dir.path().join("tracked.txt").exists());
        assert!(!dir.path().join("loose.txt").exists());
        assert!(!dir.path().join("scratch").exists());
        Ok(())
    }
}
