//! Integration tests for steps whose effect depends on state discovered
//! earlier in the saga.

use std::sync::Mutex;

use async_trait::async_trait;
use worktree_saga::{SagaBuilder, SagaStep, StepKind};

struct TestContext {
    dirty: bool,
    operations: Mutex<Vec<&'static str>>,
}

impl TestContext {
    fn new(dirty: bool) -> Self {
        Self {
            dirty,
            operations: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, op: &'static str) {
        self.operations.lock().expect("lock poisoned").push(op);
    }

    fn operations(&self) -> Vec<&'static str> {
        self.operations.lock().expect("lock poisoned").clone()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

#[derive(Clone, Debug, Default)]
struct SyncState {
    has_changes: bool,
    stash_created: bool,
}

struct DetectChanges;

#[async_trait]
impl SagaStep for DetectChanges {
    type Input = SyncState;
    type Output = SyncState;
    type Context = TestContext;
    type Error = TestError;

    fn name(&self) -> &'static str {
        "detect_changes"
    }

    fn kind(&self) -> StepKind {
        StepKind::ReadOnly
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        input.has_changes = ctx.dirty;
        Ok(input)
    }
}

struct StashIfDirty;

#[async_trait]
impl SagaStep for StashIfDirty {
    type Input = SyncState;
    type Output = SyncState;
    type Context = TestContext;
    type Error = TestError;

    fn name(&self) -> &'static str {
        "stash_changes"
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        mut input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        if input.has_changes {
            ctx.push("stash push");
            input.stash_created = true;
        }
        Ok(input)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        output: Self::Output,
    ) -> Result<(), Self::Error> {
        if output.stash_created {
            ctx.push("stash pop");
        }
        Ok(())
    }
}

struct Fail;

#[async_trait]
impl SagaStep for Fail {
    type Input = SyncState;
    type Output = SyncState;
    type Context = TestContext;
    type Error = TestError;

    fn name(&self) -> &'static str {
        "pull"
    }

    async fn execute(
        &self,
        _ctx: &Self::Context,
        _input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        Err(TestError("remote unreachable".to_string()))
    }
}

#[tokio::test]
async fn clean_state_never_touches_stash_even_on_failure() {
    let ctx = TestContext::new(false);

    let saga = SagaBuilder::new()
        .first_step(DetectChanges)
        .then(StashIfDirty)
        .then(Fail)
        .build();

    let result = saga.execute(&ctx, SyncState::default()).await;

    assert!(result.is_err());
    assert!(ctx.operations().is_empty());
}

#[tokio::test]
async fn dirty_state_compensation_sees_discovered_stash() {
    let ctx = TestContext::new(true);

    let saga = SagaBuilder::new()
        .first_step(DetectChanges)
        .then(StashIfDirty)
        .then(Fail)
        .build();

    let result = saga.execute(&ctx, SyncState::default()).await;

    assert!(result.is_err());
    assert_eq!(ctx.operations(), vec!["stash push", "stash pop"]);
}

#[tokio::test]
async fn successful_run_returns_final_state() -> anyhow::Result<()> {
    let ctx = TestContext::new(true);

    let saga = SagaBuilder::new()
        .first_step(DetectChanges)
        .then(StashIfDirty)
        .build();

    let state = saga.execute(&ctx, SyncState::default()).await?;

    assert!(state.has_changes);
    assert!(state.stash_created);
    assert_eq!(ctx.operations(), vec!["stash push"]);
    Ok(())
}
