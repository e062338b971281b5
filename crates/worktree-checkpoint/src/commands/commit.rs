use std::path::PathBuf;

use clap::Args;
use worktree_operations::sagas::{CommitRequest, CommitSaga, StageAndCommitSaga};

use super::CommandEnv;
use crate::error::Result;
use crate::output::{self, CommitReport};

#[derive(Args)]
pub(crate) struct CommitArgs {
    /// Commit message
    #[arg(short, long)]
    message: String,

    /// Commit only these paths instead of every change
    paths: Vec<PathBuf>,

    /// Record a commit even when nothing changed
    #[arg(long)]
    allow_empty: bool,
}

pub(crate) async fn run(env: &CommandEnv, args: CommitArgs) -> Result<()> {
    let ctx = env.single("commit")?;
    let output = if args.paths.is_empty() {
        let request = CommitRequest::all(&args.message).allow_empty(args.allow_empty);
        CommitSaga::run(&ctx, request).await?
    } else {
        let request =
            CommitRequest::paths(&args.message, args.paths).allow_empty(args.allow_empty);
        StageAndCommitSaga::run(&ctx, request).await?
    };
    output::emit(env.format(), &CommitReport::from(output))
}
