mod command;
mod commit;
mod diff;
mod patch;
mod refs;
mod remote;
mod reset;
mod snapshot;
mod staging;
mod stash;
mod status;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::{GitError, Result};

pub(crate) use command::GitCommand;

const DEFAULT_PROGRAM: &str = "git";

/// A working tree driven through the `git` executable.
///
/// Every operation that spawns a process takes a [`CancellationToken`]; cancelling it kills the
/// child and surfaces [`GitError::Cancelled`].
#[derive(Debug, Clone)]
pub struct Repository {
    root: PathBuf,
    program: OsString,
}

impl Repository {
    /// # Errors
    ///
    /// Returns [`GitError::NotARepository`] if the path is not inside a git repository.
    pub fn open(path: &Path) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|_| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        let root = inner.workdir().ok_or_else(|| GitError::NotARepository {
            path: path.to_path_buf(),
        })?;

        // Use dunce to get a path without the \\?\ prefix on Windows
        let root = dunce::simplified(root).to_path_buf();

        Ok(Self {
            root,
            program: OsString::from(DEFAULT_PROGRAM),
        })
    }

    /// Use a different git executable for all spawned commands.
    #[must_use]
    pub fn with_program(mut self, program: impl AsRef<OsStr>) -> Self {
        self.program = program.as_ref().to_os_string();
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn command(&self) -> GitCommand {
        GitCommand::new(&self.program)
    }

    /// Runs `git <args>` in the working tree and returns its stdout.
    pub(crate) async fn git<I, S>(&self, args: I, cancel: &CancellationToken) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.command().args(args).run(&self.root, cancel).await
    }

    pub(crate) fn inner(&self) -> Result<git2::Repository> {
        Ok(git2::Repository::open(&self.root)?)
    }

    pub(crate) fn to_relative_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            // Use dunce to normalize the path (removes \\?\ prefix on Windows)
            let normalized = dunce::simplified(path);
            normalized
                .strip_prefix(&self.root)
                .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
        } else {
            path.to_path_buf()
        }
    }
}
