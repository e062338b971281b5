use clap::Args;
use worktree_operations::checkpoint::CheckpointId;

use super::{CommandEnv, check_failures};
use crate::error::Result;
use crate::output::{self, CaptureReports, CaptureStarted};

#[derive(Args)]
pub(crate) struct CaptureArgs {
    /// Checkpoint id, usable later with `diff` and `restore`
    id: CheckpointId,

    /// Wait for every directory and report each result
    #[arg(long)]
    wait: bool,
}

pub(crate) async fn run(env: &CommandEnv, args: CaptureArgs) -> Result<()> {
    let manager = env.manager();

    if args.wait {
        let report = CaptureReports {
            reports: manager.capture_and_wait(&args.id).await,
            id: args.id,
        };
        output::emit(env.format(), &report)?;
        return check_failures("capture", report.failed(), report.reports.len());
    }

    let handles = manager.capture(&args.id);
    output::emit(
        env.format(),
        &CaptureStarted {
            directories: handles.iter().map(|h| h.cwd().to_path_buf()).collect(),
            id: args.id,
        },
    )?;
    // Outcomes are logged by the manager; the process only stays up until they land.
    manager.shutdown().await;
    Ok(())
}
