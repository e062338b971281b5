use tokio_util::sync::CancellationToken;

use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Unified diff between two tree-ish revisions.
    ///
    /// File headers always use the `a/` and `b/` prefixes, whatever the user's diff config says.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if either side cannot be resolved.
    pub async fn diff(&self, from: &str, to: &str, cancel: &CancellationToken) -> Result<String> {
        let command = self.command().args([
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--no-renames",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            from,
            to,
            "--",
        ]);
        let output = command.output(self.root(), cancel).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("unknown revision") || stderr.contains("bad object") {
                return Err(GitError::RefNotFound {
                    refspec: format!("{from}..{to}"),
                });
            }
            command.check(&output)?;
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
