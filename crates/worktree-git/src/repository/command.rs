use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::process::{Output, Stdio};

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::{GitError, Result};

/// A single invocation of the git executable inside a working tree.
///
/// The child is killed when the invocation is cancelled or its future is dropped.
pub(crate) struct GitCommand {
    program: OsString,
    args: Vec<OsString>,
    envs: Vec<(OsString, OsString)>,
}

impl GitCommand {
    pub(crate) fn new(program: &OsStr) -> Self {
        Self {
            program: program.to_os_string(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub(crate) fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub(crate) fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|arg| arg.as_ref().to_os_string()));
        self
    }

    pub(crate) fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Rendering of the arguments used in error messages.
    pub(crate) fn display(&self) -> String {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command and returns its raw output without checking the exit status.
    pub(crate) async fn output(&self, cwd: &Path, cancel: &CancellationToken) -> Result<Output> {
        if cancel.is_cancelled() {
            return Err(GitError::Cancelled {
                command: self.display(),
            });
        }

        trace!(command = %self.display(), cwd = %cwd.display(), "running git");

        let child = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k, v)))
            .env("GIT_TERMINAL_PROMPT", "0")
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GitError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        tokio::select! {
            () = cancel.cancelled() => Err(GitError::Cancelled {
                command: self.display(),
            }),
            output = child.wait_with_output() => output.map_err(|source| GitError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            }),
        }
    }

    /// Runs the command and returns stdout, failing on a non-zero exit status.
    pub(crate) async fn run(&self, cwd: &Path, cancel: &CancellationToken) -> Result<String> {
        let output = self.output(cwd, cancel).await?;
        self.check(&output)?;
        String::from_utf8(output.stdout).map_err(|_| GitError::InvalidOutput {
            command: self.display(),
            detail: "stdout is not valid UTF-8".to_string(),
        })
    }

    pub(crate) fn check(&self, output: &Output) -> Result<()> {
        if output.status.success() {
            return Ok(());
        }

        let status = output
            .status
            .code()
            .map_or_else(|| "signal".to_string(), |code| format!("status {code}"));

        Err(GitError::CommandFailed {
            command: self.display(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
