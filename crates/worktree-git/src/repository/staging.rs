use std::ffi::OsString;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::Result;

use super::Repository;

impl Repository {
    /// Stages the given paths, including deletions.
    ///
    /// # Errors
    ///
    /// Returns an error if `git add` fails.
    pub async fn stage_paths(&self, paths: &[&Path], cancel: &CancellationToken) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let args = self.path_args(["add", "-A", "--"], paths);
        self.git(args, cancel).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if `git add` fails.
    pub async fn stage_all(&self, cancel: &CancellationToken) -> Result<()> {
        self.git(["add", "-A"], cancel).await?;
        Ok(())
    }

    /// Resets the index to HEAD without touching the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be reset.
    pub async fn unstage_all(&self, cancel: &CancellationToken) -> Result<()> {
        if self.head_sha()?.is_some() {
            self.git(["reset", "-q"], cancel).await?;
        } else {
            self.git(["rm", "-r", "-q", "--cached", "--ignore-unmatch", "."], cancel)
                .await?;
        }
        Ok(())
    }

    /// Resets only the given paths in the index to their HEAD state.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be reset.
    pub async fn unstage_paths(&self, paths: &[&Path], cancel: &CancellationToken) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let args = if self.head_sha()?.is_some() {
            self.path_args(["reset", "-q", "HEAD", "--"], paths)
        } else {
            self.path_args(["rm", "-q", "--cached", "--ignore-unmatch", "--"], paths)
        };
        self.git(args, cancel).await?;
        Ok(())
    }

    fn path_args<const N: usize>(&self, prefix: [&str; N], paths: &[&Path]) -> Vec<OsString> {
        prefix
            .into_iter()
            .map(OsString::from)
            .chain(
                paths
                    .iter()
                    .map(|path| self.to_relative_path(path).into_os_string()),
            )
            .collect()
    }
}
