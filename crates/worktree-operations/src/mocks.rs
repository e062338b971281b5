use std::collections::{BTreeMap, HashMap, HashSet};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use worktree_git::{ApplyOptions, CommitInfo, GitError, ResetMode, StashEntry, Upstream};
use worktree_saga::SagaStep;

use crate::config::WorktreeConfig;
use crate::context::GitSagaContext;
use crate::traits::GitProvider;
use crate::{OperationError, Result};

struct MockState {
    head: Option<String>,
    branch: Option<String>,
    upstream: Option<Upstream>,
    dirty: bool,
    staged: Vec<PathBuf>,
    /// Stash subjects, newest first like `git stash list`.
    stashes: Vec<String>,
    stash_noop: bool,
    commits: usize,
    snapshots: usize,
    /// Commits without a parent; `<commit>^` does not resolve for these.
    root_commits: HashSet<String>,
    refs: HashMap<PathBuf, BTreeMap<String, String>>,
    diffs: HashMap<PathBuf, String>,
    last_patch: Option<(PathBuf, String)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            head: None,
            branch: Some("main".to_string()),
            upstream: None,
            dirty: false,
            staged: Vec::new(),
            stashes: Vec::new(),
            stash_noop: false,
            commits: 0,
            snapshots: 0,
            root_commits: HashSet::new(),
            refs: HashMap::new(),
            diffs: HashMap::new(),
            last_patch: None,
        }
    }
}

/// In-memory [`GitProvider`] that records every call as `"<operation> <args>"`.
///
/// `head_sha`, `current_branch` and `upstream` are not recorded so call logs only show
/// cancellable git invocations.
#[derive(Default)]
pub struct MockGitProvider {
    state: Mutex<MockState>,
    calls: Mutex<Vec<(PathBuf, String)>>,
    failing: Vec<(Option<PathBuf>, String)>,
}

impl MockGitProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state_mut(&mut self) -> &mut MockState {
        self.state.get_mut().expect("mock state lock poisoned")
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    #[must_use]
    pub fn with_head(mut self, sha: &str) -> Self {
        self.state_mut().head = Some(sha.to_string());
        self
    }

    #[must_use]
    pub fn with_branch(mut self, branch: &str) -> Self {
        self.state_mut().branch = Some(branch.to_string());
        self
    }

    #[must_use]
    pub fn detached(mut self) -> Self {
        self.state_mut().branch = None;
        self
    }

    #[must_use]
    pub fn with_upstream(mut self, upstream: Upstream) -> Self {
        self.state_mut().upstream = Some(upstream);
        self
    }

    #[must_use]
    pub fn dirty(mut self, dirty: bool) -> Self {
        self.state_mut().dirty = dirty;
        self
    }

    #[must_use]
    pub fn with_staged(mut self, paths: &[&str]) -> Self {
        self.state_mut().staged = paths.iter().map(PathBuf::from).collect();
        self
    }

    #[must_use]
    pub fn with_stash(mut self, subject: &str) -> Self {
        self.state_mut().stashes.push(subject.to_string());
        self
    }

    /// `stash_push` succeeds without creating an entry.
    #[must_use]
    pub fn stash_push_is_noop(mut self) -> Self {
        self.state_mut().stash_noop = true;
        self
    }

    #[must_use]
    pub fn with_diff(mut self, root: &str, diff: &str) -> Self {
        self.state_mut()
            .diffs
            .insert(PathBuf::from(root), diff.to_string());
        self
    }

    /// Marks `sha` as a commit without a parent.
    #[must_use]
    pub fn with_root_commit(mut self, sha: &str) -> Self {
        self.state_mut().root_commits.insert(sha.to_string());
        self
    }

    #[must_use]
    pub fn with_ref(mut self, root: &str, name: &str, target: &str) -> Self {
        self.state_mut()
            .refs
            .entry(PathBuf::from(root))
            .or_default()
            .insert(name.to_string(), target.to_string());
        self
    }

    /// Fails every call to `operation`, in any directory.
    #[must_use]
    pub fn failing_on(mut self, operation: &str) -> Self {
        self.failing.push((None, operation.to_string()));
        self
    }

    /// Fails calls to `operation` in `root` only.
    #[must_use]
    pub fn failing_in(mut self, root: &str, operation: &str) -> Self {
        self.failing
            .push((Some(PathBuf::from(root)), operation.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn calls_in(&self, root: &str) -> Vec<String> {
        let root = Path::new(root);
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .iter()
            .filter(|(dir, _)| dir == root)
            .map(|(_, call)| call.clone())
            .collect()
    }

    /// Operation names without arguments, in call order.
    pub fn operations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|call| {
                call.split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
            .collect()
    }

    pub fn staged(&self) -> Vec<PathBuf> {
        self.state().staged.clone()
    }

    pub fn head(&self) -> Option<String> {
        self.state().head.clone()
    }

    pub fn stashes(&self) -> Vec<String> {
        self.state().stashes.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.state().dirty
    }

    pub fn refs_in(&self, root: &str) -> BTreeMap<String, String> {
        self.state()
            .refs
            .get(Path::new(root))
            .cloned()
            .unwrap_or_default()
    }

    pub fn last_patch_path(&self) -> Option<PathBuf> {
        self.state().last_patch.as_ref().map(|(path, _)| path.clone())
    }

    pub fn last_patch_contents(&self) -> Option<String> {
        self.state()
            .last_patch
            .as_ref()
            .map(|(_, contents)| contents.clone())
    }

    fn check(&self, root: &Path, call: &str) -> Result<()> {
        let operation = call.split_whitespace().next().unwrap_or_default();
        let fails = self.failing.iter().any(|(dir, op)| {
            op == operation && dir.as_deref().is_none_or(|dir| dir == root)
        });
        if fails {
            return Err(GitError::CommandFailed {
                command: format!("git {call}"),
                status: "status 1".to_string(),
                stderr: format!("mock failure in {operation}"),
            }
            .into());
        }
        Ok(())
    }

    fn record(&self, root: &Path, call: String) -> Result<()> {
        self.calls
            .lock()
            .expect("mock call lock poisoned")
            .push((root.to_path_buf(), call.clone()));
        self.check(root, &call)
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl GitProvider for MockGitProvider {
    async fn head_sha(&self, root: &Path) -> Result<Option<String>> {
        self.check(root, "head_sha")?;
        Ok(self.state().head.clone())
    }

    async fn current_branch(&self, root: &Path) -> Result<Option<String>> {
        self.check(root, "current_branch")?;
        Ok(self.state().branch.clone())
    }

    async fn upstream(&self, root: &Path) -> Result<Option<Upstream>> {
        self.check(root, "upstream")?;
        Ok(self.state().upstream.clone())
    }

    async fn rev_parse(
        &self,
        root: &Path,
        rev: &str,
        _cancel: &CancellationToken,
    ) -> Result<String> {
        self.record(root, format!("rev_parse {rev}"))?;
        let state = self.state();
        if let Some(commit) = rev.strip_suffix('^') {
            if state.root_commits.contains(commit) {
                return Err(GitError::RefNotFound {
                    refspec: rev.to_string(),
                }
                .into());
            }
            return Ok(format!("parent-of-{commit}"));
        }
        if rev == "HEAD" {
            return state.head.clone().ok_or_else(|| GitError::UnbornHead.into());
        }
        if let Some(target) = state.refs.get(root).and_then(|refs| refs.get(rev)) {
            return Ok(target.clone());
        }
        if rev.starts_with("refs/") {
            return Err(GitError::RefNotFound {
                refspec: rev.to_string(),
            }
            .into());
        }
        Ok(rev.to_string())
    }

    async fn has_changes(&self, root: &Path, _cancel: &CancellationToken) -> Result<bool> {
        self.record(root, "has_changes".to_string())?;
        Ok(self.state().dirty)
    }

    async fn staged_files(&self, root: &Path, _cancel: &CancellationToken) -> Result<Vec<PathBuf>> {
        self.record(root, "staged_files".to_string())?;
        Ok(self.state().staged.clone())
    }

    async fn stage_all(&self, root: &Path, _cancel: &CancellationToken) -> Result<()> {
        self.record(root, "stage_all".to_string())
    }

    async fn stage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("stage_paths {}", join_paths(paths)))?;
        let mut state = self.state();
        for path in paths {
            if !state.staged.contains(path) {
                state.staged.push(path.clone());
            }
        }
        Ok(())
    }

    async fn unstage_all(&self, root: &Path, _cancel: &CancellationToken) -> Result<()> {
        self.record(root, "unstage_all".to_string())?;
        self.state().staged.clear();
        Ok(())
    }

    async fn unstage_paths(
        &self,
        root: &Path,
        paths: &[PathBuf],
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("unstage_paths {}", join_paths(paths)))?;
        self.state().staged.retain(|staged| !paths.contains(staged));
        Ok(())
    }

    async fn commit(
        &self,
        root: &Path,
        message: &str,
        _allow_empty: bool,
        _cancel: &CancellationToken,
    ) -> Result<CommitInfo> {
        self.record(root, format!("commit {message}"))?;
        let mut state = self.state();
        state.commits += 1;
        let sha = format!("commit-{}", state.commits);
        state.head = Some(sha.clone());
        state.staged.clear();
        Ok(CommitInfo {
            sha,
            message: message.to_string(),
        })
    }

    async fn reset(
        &self,
        root: &Path,
        mode: ResetMode,
        target: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        let flag = match mode {
            ResetMode::Soft => "--soft",
            ResetMode::Mixed => "--mixed",
            ResetMode::Hard => "--hard",
        };
        self.record(root, format!("reset {flag} {target}"))?;
        let mut state = self.state();
        state.head = Some(target.to_string());
        if mode == ResetMode::Hard {
            state.dirty = false;
        }
        Ok(())
    }

    async fn clean_untracked(&self, root: &Path, _cancel: &CancellationToken) -> Result<()> {
        self.record(root, "clean_untracked".to_string())
    }

    async fn stash_push(
        &self,
        root: &Path,
        message: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("stash_push {message}"))?;
        let mut state = self.state();
        if state.dirty && !state.stash_noop {
            let branch = state.branch.clone().unwrap_or_else(|| "(no branch)".to_string());
            state.stashes.insert(0, format!("On {branch}: {message}"));
            state.dirty = false;
        }
        Ok(())
    }

    async fn stash_pop(&self, root: &Path, _cancel: &CancellationToken) -> Result<()> {
        self.record(root, "stash_pop".to_string())?;
        let mut state = self.state();
        if state.stashes.is_empty() {
            return Err(GitError::CommandFailed {
                command: "git stash pop -q".to_string(),
                status: "status 1".to_string(),
                stderr: "No stash entries found.".to_string(),
            }
            .into());
        }
        state.stashes.remove(0);
        state.dirty = true;
        Ok(())
    }

    async fn stash_list(&self, root: &Path, _cancel: &CancellationToken) -> Result<Vec<StashEntry>> {
        self.record(root, "stash_list".to_string())?;
        Ok(self
            .state()
            .stashes
            .iter()
            .enumerate()
            .map(|(index, subject)| StashEntry {
                index,
                subject: subject.clone(),
            })
            .collect())
    }

    async fn pull(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("pull {remote} {branch}"))
    }

    async fn push(
        &self,
        root: &Path,
        remote: &str,
        branch: &str,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("push {remote} {branch}"))
    }

    async fn apply_patch(
        &self,
        root: &Path,
        patch: &Path,
        options: ApplyOptions,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        let contents = std::fs::read_to_string(patch).unwrap_or_default();
        self.state().last_patch = Some((patch.to_path_buf(), contents));

        let mut call = String::from("apply_patch");
        if options.cached {
            call.push_str(" --cached");
        }
        if options.reverse {
            call.push_str(" --reverse");
        }
        self.record(root, call)
    }

    async fn diff(
        &self,
        root: &Path,
        from: &str,
        to: &str,
        _cancel: &CancellationToken,
    ) -> Result<String> {
        self.record(root, format!("diff {from} {to}"))?;
        Ok(self.state().diffs.get(root).cloned().unwrap_or_default())
    }

    async fn snapshot_tree(&self, root: &Path, _cancel: &CancellationToken) -> Result<String> {
        self.record(root, "snapshot_tree".to_string())?;
        let mut state = self.state();
        state.snapshots += 1;
        Ok(format!("tree-snapshot-{}", state.snapshots))
    }

    async fn commit_tree(
        &self,
        root: &Path,
        tree: &str,
        parent: Option<&str>,
        message: &str,
        _cancel: &CancellationToken,
    ) -> Result<String> {
        self.record(
            root,
            format!("commit_tree {tree} {} {message}", parent.unwrap_or("-")),
        )?;
        let mut state = self.state();
        state.commits += 1;
        let commit = format!("checkpoint-commit-{}", state.commits);
        if parent.is_none() {
            state.root_commits.insert(commit.clone());
        }
        Ok(commit)
    }

    async fn read_ref(
        &self,
        root: &Path,
        name: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        self.record(root, format!("read_ref {name}"))?;
        Ok(self
            .state()
            .refs
            .get(root)
            .and_then(|refs| refs.get(name))
            .cloned())
    }

    async fn update_ref(
        &self,
        root: &Path,
        name: &str,
        target: &str,
        expected_old: Option<&str>,
        _cancel: &CancellationToken,
    ) -> Result<()> {
        self.record(root, format!("update_ref {name} {target}"))?;
        let mut state = self.state();
        let refs = state.refs.entry(root.to_path_buf()).or_default();
        let current = refs.get(name).map(String::as_str);
        let matches = match expected_old {
            None => true,
            Some("") => current.is_none(),
            Some(old) => current == Some(old),
        };
        if !matches {
            return Err(GitError::CommandFailed {
                command: format!("git update-ref {name} {target}"),
                status: "status 128".to_string(),
                stderr: format!("cannot lock ref '{name}'"),
            }
            .into());
        }
        refs.insert(name.to_string(), target.to_string());
        Ok(())
    }

    async fn delete_ref(&self, root: &Path, name: &str, _cancel: &CancellationToken) -> Result<()> {
        self.record(root, format!("delete_ref {name}"))?;
        let mut state = self.state();
        if name == "HEAD" {
            state.head = None;
        } else if let Some(refs) = state.refs.get_mut(root) {
            refs.remove(name);
        }
        Ok(())
    }

    async fn list_refs(
        &self,
        root: &Path,
        prefix: &str,
        _cancel: &CancellationToken,
    ) -> Result<Vec<(String, String)>> {
        self.record(root, format!("list_refs {prefix}"))?;
        Ok(self
            .state()
            .refs
            .get(root)
            .map(|refs| {
                refs.iter()
                    .filter(|(name, _)| name.starts_with(prefix))
                    .map(|(name, target)| (name.clone(), target.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

pub fn mock_context(git: &Arc<MockGitProvider>, root: &str) -> GitSagaContext<MockGitProvider> {
    GitSagaContext::new(
        PathBuf::from(root),
        Arc::clone(git),
        Arc::new(WorktreeConfig::default()),
    )
}

/// Mutating step that always fails; appended to a saga to force an unwind.
pub struct FailingStep<D, G> {
    name: &'static str,
    _marker: PhantomData<fn() -> (D, G)>,
}

impl<D, G> FailingStep<D, G> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<D, G> SagaStep for FailingStep<D, G>
where
    D: Clone + Send + Sync + 'static,
    G: GitProvider + 'static,
{
    type Input = D;
    type Output = D;
    type Context = GitSagaContext<G>;
    type Error = OperationError;

    fn name(&self) -> &'static str {
        self.name
    }

    async fn execute(
        &self,
        _ctx: &Self::Context,
        _input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        Err(GitError::CommandFailed {
            command: self.name.to_string(),
            status: "status 1".to_string(),
            stderr: "forced failure".to_string(),
        }
        .into())
    }
}
