use tokio_util::sync::CancellationToken;

use crate::types::Upstream;
use crate::{Repository, Result};

impl Repository {
    /// # Errors
    ///
    /// Returns an error if the remote lookup fails.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let repo = self.inner()?;
        let Ok(remote) = repo.find_remote(name) else {
            return Ok(None);
        };

        Ok(remote.url().map(String::from))
    }

    /// Remote and branch the current branch tracks, if configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository configuration cannot be read.
    pub fn upstream(&self) -> Result<Option<Upstream>> {
        let Some(branch) = self.current_branch()? else {
            return Ok(None);
        };
        let config = self.inner()?.config()?;

        let Ok(remote) = config.get_string(&format!("branch.{branch}.remote")) else {
            return Ok(None);
        };
        let Ok(merge) = config.get_string(&format!("branch.{branch}.merge")) else {
            return Ok(None);
        };

        let branch = merge
            .strip_prefix("refs/heads/")
            .unwrap_or(&merge)
            .to_string();
        Ok(Some(Upstream { remote, branch }))
    }

    /// Fetches `branch` from `remote` and merges it into the current branch.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the merge cannot complete.
    pub async fn pull(&self, remote: &str, branch: &str, cancel: &CancellationToken) -> Result<()> {
        self.git(["pull", "-q", "--no-rebase", "--no-edit", remote, branch], cancel)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the remote rejects the push.
    pub async fn push(&self, remote: &str, branch: &str, cancel: &CancellationToken) -> Result<()> {
        self.git(["push", "-q", remote, branch], cancel).await?;
        Ok(())
    }
}
