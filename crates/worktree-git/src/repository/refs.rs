use tokio_util::sync::CancellationToken;

use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Object id stored in a ref, or `None` if the ref does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if `git rev-parse` fails for a reason other than a missing ref.
    pub async fn read_ref(&self, name: &str, cancel: &CancellationToken) -> Result<Option<String>> {
        let command = self
            .command()
            .args(["rev-parse", "--verify", "--quiet", name]);
        let output = command.output(self.root(), cancel).await?;

        // --quiet exits 1 with no stderr when the ref is missing
        if output.status.code() == Some(1) && output.stderr.is_empty() {
            return Ok(None);
        }
        command.check(&output)?;

        let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if sha.is_empty() {
            return Err(GitError::InvalidOutput {
                command: command.display(),
                detail: "empty object id".to_string(),
            });
        }
        Ok(Some(sha))
    }

    /// Points `name` at `target`. With `expected_old`, the update only happens if the ref
    /// currently holds that value; an empty string asserts the ref does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if `git update-ref` fails or the expected value does not match.
    pub async fn update_ref(
        &self,
        name: &str,
        target: &str,
        expected_old: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut command = self.command().args(["update-ref", name, target]);
        if let Some(old) = expected_old {
            command = command.arg(old);
        }
        command.run(self.root(), cancel).await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if `git update-ref -d` fails.
    pub async fn delete_ref(&self, name: &str, cancel: &CancellationToken) -> Result<()> {
        self.git(["update-ref", "-d", name], cancel).await?;
        Ok(())
    }

    /// All refs below `prefix` as `(name, object id)` pairs, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `git for-each-ref` fails.
    pub async fn list_refs(
        &self,
        prefix: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<(String, String)>> {
        let out = self
            .git(
                [
                    "for-each-ref",
                    "--sort=refname",
                    "--format=%(refname) %(objectname)",
                    prefix,
                ],
                cancel,
            )
            .await?;

        out.lines()
            .map(|line| {
                line.rsplit_once(' ')
                    .map(|(name, sha)| (name.to_string(), sha.to_string()))
                    .ok_or_else(|| GitError::InvalidOutput {
                        command: "for-each-ref".to_string(),
                        detail: format!("malformed line '{line}'"),
                    })
            })
            .collect()
    }
}
