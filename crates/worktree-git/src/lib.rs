//! Cancellable git client for a single working tree.
//!
//! Repository discovery and read-only metadata go through `git2`; everything that changes the
//! tree, the index, refs or remotes runs the `git` executable so hooks and user config apply.

mod error;
mod repository;
mod types;

pub use error::GitError;
pub use repository::Repository;
pub use types::{
    ApplyOptions, CommitInfo, FileStatus, ResetMode, StashEntry, StatusEntry, Upstream,
};

pub type Result<T> = std::result::Result<T, GitError>;
