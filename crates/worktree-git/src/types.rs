use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
    Unmerged,
    Untracked,
}

impl FileStatus {
    /// Map one column of a porcelain v1 status code. A space means unchanged.
    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            b'A' => Some(Self::Added),
            b'M' => Some(Self::Modified),
            b'D' => Some(Self::Deleted),
            b'R' => Some(Self::Renamed),
            b'C' => Some(Self::Copied),
            b'T' => Some(Self::TypeChanged),
            b'U' => Some(Self::Unmerged),
            b'?' => Some(Self::Untracked),
            _ => None,
        }
    }
}

/// One path reported by `git status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub path: PathBuf,
    /// Change recorded in the index relative to HEAD.
    pub index: Option<FileStatus>,
    /// Change in the working tree relative to the index.
    pub worktree: Option<FileStatus>,
    pub old_path: Option<PathBuf>,
}

impl StatusEntry {
    #[must_use]
    pub fn is_staged(&self) -> bool {
        !matches!(self.index, None | Some(FileStatus::Untracked))
    }

    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.index == Some(FileStatus::Untracked)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    Soft,
    Mixed,
    Hard,
}

impl ResetMode {
    pub(crate) fn flag(self) -> &'static str {
        match self {
            Self::Soft => "--soft",
            Self::Mixed => "--mixed",
            Self::Hard => "--hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyOptions {
    /// Apply to the index only, leaving the working tree alone.
    pub cached: bool,
    /// Apply the patch in reverse.
    pub reverse: bool,
}

impl ApplyOptions {
    #[must_use]
    pub fn reversed(self) -> Self {
        Self {
            reverse: !self.reverse,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StashEntry {
    pub index: usize,
    /// Reflog subject, e.g. `On main: my message`.
    pub subject: String,
}

impl StashEntry {
    /// True when the stash was created with exactly `message`.
    #[must_use]
    pub fn has_message(&self, message: &str) -> bool {
        self.subject
            .split_once(": ")
            .is_some_and(|(_, rest)| rest == message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub remote: String,
    pub branch: String,
}
