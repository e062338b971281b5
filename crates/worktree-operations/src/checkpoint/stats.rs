use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::Serialize;

const NO_FILE: &str = "/dev/null";

/// Line and file counts of a unified diff, summable across working directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub lines_added: u64,
    pub lines_removed: u64,
    pub files_changed: BTreeSet<PathBuf>,
}

impl DiffStats {
    /// Counts `+`/`-` lines outside the `+++`/`---` markers and collects the paths of file
    /// headers. Only `a/` or `b/` prefixed paths are headers; any other `+++`/`---` line is a
    /// content line and is neither a file nor counted.
    #[must_use]
    pub fn parse(diff: &str) -> Self {
        let mut stats = Self::default();
        for line in diff.lines() {
            if let Some(header) = line
                .strip_prefix("+++ ")
                .or_else(|| line.strip_prefix("--- "))
            {
                if let Some(path) = header_path(header) {
                    stats.files_changed.insert(path);
                }
            } else if line.starts_with('+') && !line.starts_with("+++") {
                stats.lines_added += 1;
            } else if line.starts_with('-') && !line.starts_with("---") {
                stats.lines_removed += 1;
            }
        }
        stats
    }

    pub fn merge(&mut self, other: Self) {
        self.lines_added += other.lines_added;
        self.lines_removed += other.lines_removed;
        self.files_changed.extend(other.files_changed);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines_added == 0 && self.lines_removed == 0 && self.files_changed.is_empty()
    }
}

fn header_path(header: &str) -> Option<PathBuf> {
    let header = header.trim_end();
    let header = header
        .strip_prefix('"')
        .and_then(|h| h.strip_suffix('"'))
        .unwrap_or(header);
    if header == NO_FILE {
        return None;
    }
    let path = header
        .strip_prefix("a/")
        .or_else(|| header.strip_prefix("b/"))?;
    (!path.is_empty()).then(|| PathBuf::from(path))
}

impl Extend<DiffStats> for DiffStats {
    fn extend<I: IntoIterator<Item = DiffStats>>(&mut self, iter: I) {
        for stats in iter {
            self.merge(stats);
        }
    }
}
