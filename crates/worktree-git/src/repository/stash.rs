use tokio_util::sync::CancellationToken;

use crate::Result;
use crate::types::StashEntry;

use super::Repository;

impl Repository {
    /// Stashes local changes under `message`.
    ///
    /// Git exits successfully without creating an entry when there is nothing to stash; compare
    /// [`Repository::stash_count`] before and after to tell the cases apart.
    ///
    /// # Errors
    ///
    /// Returns an error if `git stash push` fails.
    pub async fn stash_push(
        &self,
        message: &str,
        include_untracked: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut command = self.command().args(["stash", "push", "-q", "-m", message]);
        if include_untracked {
            command = command.arg("--include-untracked");
        }
        command.run(self.root(), cancel).await?;
        Ok(())
    }

    /// Applies the most recent stash and drops it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stash is empty or the changes conflict.
    pub async fn stash_pop(&self, cancel: &CancellationToken) -> Result<()> {
        self.git(["stash", "pop", "-q"], cancel).await?;
        Ok(())
    }

    /// Stash entries, most recent first.
    ///
    /// # Errors
    ///
    /// Returns an error if `git stash list` fails.
    pub async fn stash_list(&self, cancel: &CancellationToken) -> Result<Vec<StashEntry>> {
        let out = self.git(["stash", "list", "--format=%gs"], cancel).await?;
        Ok(out
            .lines()
            .enumerate()
            .map(|(index, subject)| StashEntry {
                index,
                subject: subject.to_string(),
            })
            .collect())
    }

    /// # Errors
    ///
    /// Returns an error if `git stash list` fails.
    pub async fn stash_count(&self, cancel: &CancellationToken) -> Result<usize> {
        Ok(self.stash_list(cancel).await?.len())
    }
}
