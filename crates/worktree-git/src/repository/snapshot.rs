use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Writes a tree object holding the full working tree, untracked files included.
    ///
    /// A throwaway index is used so the real index, HEAD and working tree are left untouched.
    /// Ignored files are not part of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the underlying git commands fail.
    pub async fn snapshot_tree(&self, cancel: &CancellationToken) -> Result<String> {
        let scratch = TempDir::new().map_err(GitError::TempFile)?;
        let index = scratch.path().join("index");

        if self.head_sha()?.is_some() {
            self.command()
                .args(["read-tree", "HEAD"])
                .env("GIT_INDEX_FILE", &index)
                .run(self.root(), cancel)
                .await?;
        }

        self.command()
            .args(["add", "-A"])
            .env("GIT_INDEX_FILE", &index)
            .run(self.root(), cancel)
            .await?;

        let tree = self
            .command()
            .arg("write-tree")
            .env("GIT_INDEX_FILE", &index)
            .run(self.root(), cancel)
            .await?;

        Ok(tree.trim().to_string())
    }
}
