use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::types::{FileStatus, StatusEntry};
use crate::{GitError, Result};

use super::Repository;

impl Repository {
    /// Commit id HEAD points at, or `None` while the current branch is unborn.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    pub fn head_sha(&self) -> Result<Option<String>> {
        let repo = self.inner()?;
        match repo.head() {
            Ok(head) => Ok(head.target().map(|oid| oid.to_string())),
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::UnbornBranch | git2::ErrorCode::NotFound
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Branch HEAD is attached to, or `None` when HEAD is detached.
    ///
    /// An unborn branch still reports its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be read.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let repo = self.inner()?;
        if repo.head_detached()? {
            return Ok(None);
        }

        let head = repo.find_reference("HEAD")?;
        let branch = head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(String::from);
        Ok(branch)
    }

    /// Resolves a revision to a full commit id.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::RefNotFound`] if the revision does not name a commit.
    pub async fn rev_parse(&self, rev: &str, cancel: &CancellationToken) -> Result<String> {
        let spec = format!("{rev}^{{commit}}");
        match self.git(["rev-parse", "--verify", "--quiet", &spec], cancel).await {
            Ok(out) => Ok(out.trim().to_string()),
            Err(GitError::CommandFailed { .. }) => Err(GitError::RefNotFound {
                refspec: rev.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns an error if `git status` fails.
    pub async fn status(&self, cancel: &CancellationToken) -> Result<Vec<StatusEntry>> {
        let out = self
            .git(
                ["status", "--porcelain=v1", "-z", "--untracked-files=all"],
                cancel,
            )
            .await?;
        Ok(parse_porcelain(&out))
    }

    /// True when the working tree or index differs from HEAD, untracked files included.
    ///
    /// # Errors
    ///
    /// Returns an error if `git status` fails.
    pub async fn has_changes(&self, cancel: &CancellationToken) -> Result<bool> {
        Ok(!self.status(cancel).await?.is_empty())
    }

    /// Paths whose staged content differs from HEAD.
    ///
    /// # Errors
    ///
    /// Returns an error if `git diff --cached` fails.
    pub async fn staged_files(&self, cancel: &CancellationToken) -> Result<Vec<PathBuf>> {
        let out = self
            .git(["diff", "--cached", "--name-only", "-z"], cancel)
            .await?;
        Ok(out
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0').filter(|field| !field.is_empty());

    while let Some(field) = fields.next() {
        let bytes = field.as_bytes();
        if bytes.len() < 4 {
            continue;
        }
        let (x, y) = (bytes[0], bytes[1]);

        // Renames and copies carry the source path as the following field.
        let old_path = if matches!(x, b'R' | b'C') || matches!(y, b'R' | b'C') {
            fields.next().map(PathBuf::from)
        } else {
            None
        };

        entries.push(StatusEntry {
            path: PathBuf::from(&field[3..]),
            index: FileStatus::from_code(x),
            worktree: FileStatus::from_code(y),
            old_path,
        });
    }

    entries
}
