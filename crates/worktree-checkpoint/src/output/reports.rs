use std::fmt::Write as _;
use std::path::PathBuf;

use serde::Serialize;
use worktree_operations::checkpoint::{
    CaptureReport, CheckpointId, CheckpointInfo, DiffStats, RestoreResult,
};
use worktree_operations::sagas::{CommitOutput, SyncOutput};

use super::Report;

#[derive(Debug, Serialize)]
pub(crate) struct CaptureStarted {
    pub id: CheckpointId,
    pub directories: Vec<PathBuf>,
}

impl Report for CaptureStarted {
    fn plain(&self) -> String {
        let mut out = format!(
            "Capturing checkpoint '{}' in {} director{}\n",
            self.id,
            self.directories.len(),
            plural(self.directories.len())
        );
        for dir in &self.directories {
            let _ = writeln!(out, "  {}", dir.display());
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CaptureReports {
    pub id: CheckpointId,
    pub reports: Vec<CaptureReport>,
}

impl CaptureReports {
    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.success()).count()
    }
}

impl Report for CaptureReports {
    fn plain(&self) -> String {
        let mut out = format!("Checkpoint '{}':\n", self.id);
        for report in &self.reports {
            match (&report.checkpoint, &report.error) {
                (Some(checkpoint), _) => {
                    let _ = writeln!(
                        out,
                        "  ✓ {} {}",
                        report.cwd.display(),
                        short(&checkpoint.commit)
                    );
                }
                (None, error) => {
                    let _ = writeln!(
                        out,
                        "  ✗ {}: {}",
                        report.cwd.display(),
                        error.as_deref().unwrap_or("unknown error")
                    );
                }
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DiffReport {
    pub id: CheckpointId,
    pub to: String,
    #[serde(flatten)]
    pub stats: DiffStats,
}

impl Report for DiffReport {
    fn plain(&self) -> String {
        let files = self.stats.files_changed.len();
        let mut out = format!(
            "{}..{}: {} file{} changed, +{} -{}\n",
            self.id,
            self.to,
            files,
            if files == 1 { "" } else { "s" },
            self.stats.lines_added,
            self.stats.lines_removed
        );
        for path in &self.stats.files_changed {
            let _ = writeln!(out, "  {}", path.display());
        }
        out
    }
}

/// Per-directory outcome of a restore or delete.
#[derive(Debug, Serialize)]
pub(crate) struct DirectoryResults {
    pub action: &'static str,
    pub id: CheckpointId,
    pub results: Vec<RestoreResult>,
}

impl DirectoryResults {
    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

impl Report for DirectoryResults {
    fn plain(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            if result.success {
                let _ = writeln!(out, "✓ {} {} {}", self.action, self.id, result.cwd.display());
            } else {
                let _ = writeln!(
                    out,
                    "✗ {} {} {}: {}",
                    self.action,
                    self.id,
                    result.cwd.display(),
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DirectoryCheckpoints {
    pub cwd: PathBuf,
    pub checkpoints: Vec<CheckpointInfo>,
}

impl Report for Vec<DirectoryCheckpoints> {
    fn plain(&self) -> String {
        let mut out = String::new();
        for dir in self {
            let _ = writeln!(out, "{}:", dir.cwd.display());
            if dir.checkpoints.is_empty() {
                out.push_str("  (no checkpoints)\n");
            }
            for info in &dir.checkpoints {
                let _ = writeln!(out, "  {} {}", info.id, short(&info.commit));
            }
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CommitReport {
    pub commit: String,
    pub branch: Option<String>,
}

impl From<CommitOutput> for CommitReport {
    fn from(output: CommitOutput) -> Self {
        Self {
            commit: output.commit_sha,
            branch: output.branch,
        }
    }
}

impl Report for CommitReport {
    fn plain(&self) -> String {
        match &self.branch {
            Some(branch) => format!("[{branch} {}]\n", short(&self.commit)),
            None => format!("[detached {}]\n", short(&self.commit)),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncReport {
    pub remote: String,
    pub branch: String,
    pub original_head: String,
    pub stashed: bool,
    pub orphaned_stash: Option<String>,
}

impl From<SyncOutput> for SyncReport {
    fn from(output: SyncOutput) -> Self {
        Self {
            remote: output.remote,
            branch: output.branch,
            original_head: output.original_head,
            stashed: output.stashed,
            orphaned_stash: output
                .orphaned_stash
                .map(|entry| format!("stash@{{{}}}: {}", entry.index, entry.subject)),
        }
    }
}

impl Report for SyncReport {
    fn plain(&self) -> String {
        let mut out = format!("Synced with {}/{}\n", self.remote, self.branch);
        if self.stashed {
            out.push_str("Local changes were stashed and restored\n");
        }
        if let Some(stash) = &self.orphaned_stash {
            let _ = writeln!(
                out,
                "warning: found a stash left by an earlier sync, resolve it manually: {stash}"
            );
        }
        out
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ApplyReport {
    pub patch: PathBuf,
    pub cached: bool,
}

impl Report for ApplyReport {
    fn plain(&self) -> String {
        let target = if self.cached { "index" } else { "working tree" };
        format!("Applied {} to the {target}\n", self.patch.display())
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
