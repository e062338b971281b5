use clap::Args;
use worktree_operations::sagas::{SyncRequest, SyncSaga};

use super::CommandEnv;
use crate::error::Result;
use crate::output::{self, SyncReport};

#[derive(Args)]
pub(crate) struct SyncArgs {
    /// Remote to pull from and push to (default: the branch's upstream)
    #[arg(long)]
    remote: Option<String>,

    /// Remote branch (default: the upstream branch, else the current branch)
    #[arg(long)]
    branch: Option<String>,
}

pub(crate) async fn run(env: &CommandEnv, args: SyncArgs) -> Result<()> {
    let ctx = env.single("sync")?;
    let request = SyncRequest {
        remote: args.remote,
        branch: args.branch,
    };
    let output = SyncSaga::run(&ctx, request).await?;
    output::emit(env.format(), &SyncReport::from(output))
}
