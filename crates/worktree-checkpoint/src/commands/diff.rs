use clap::Args;
use worktree_operations::checkpoint::{CheckpointId, DiffTarget};

use super::CommandEnv;
use crate::error::Result;
use crate::output::{self, DiffReport};

#[derive(Args)]
pub(crate) struct DiffArgs {
    /// Checkpoint to diff from
    id: CheckpointId,

    /// Another checkpoint id, or `current` for the live working tree
    #[arg(long, default_value = "current")]
    to: DiffTarget,
}

pub(crate) async fn run(env: &CommandEnv, args: DiffArgs) -> Result<()> {
    let stats = env.manager().diff_to(&args.id, &args.to).await;
    output::emit(
        env.format(),
        &DiffReport {
            id: args.id,
            to: args.to.to_string(),
            stats,
        },
    )
}
