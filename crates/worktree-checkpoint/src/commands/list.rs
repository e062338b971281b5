use super::CommandEnv;
use crate::error::Result;
use crate::output::{self, DirectoryCheckpoints};

pub(crate) async fn run(env: &CommandEnv) -> Result<()> {
    let manager = env.manager();
    let mut listing = Vec::with_capacity(env.directories().len());
    for dir in env.directories() {
        listing.push(DirectoryCheckpoints {
            checkpoints: manager.list(dir).await?,
            cwd: dir.clone(),
        });
    }
    output::emit(env.format(), &listing)
}
