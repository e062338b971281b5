use worktree_operations::checkpoint::CheckpointId;

use super::{CommandEnv, check_failures};
use crate::error::Result;
use crate::output::{self, DirectoryResults};

pub(crate) async fn run(env: &CommandEnv, id: &CheckpointId) -> Result<()> {
    let report = DirectoryResults {
        action: "delete",
        id: id.clone(),
        results: env.manager().delete(id).await,
    };
    output::emit(env.format(), &report)?;
    check_failures(report.action, report.failed(), report.results.len())
}
