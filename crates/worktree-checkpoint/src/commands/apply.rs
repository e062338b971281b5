use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Args;
use worktree_operations::sagas::{ApplyPatchRequest, ApplyPatchSaga};

use super::CommandEnv;
use crate::error::{CliError, Result};
use crate::output::{self, ApplyReport};

const STDIN: &str = "-";

#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// Patch file in `git diff` format, or `-` to read from stdin
    patch: PathBuf,

    /// Apply to the index only
    #[arg(long)]
    cached: bool,
}

pub(crate) async fn run(env: &CommandEnv, args: ApplyArgs) -> Result<()> {
    let ctx = env.single("apply")?;
    let patch = read_patch(&args.patch)?;
    let request = ApplyPatchRequest::new(patch).cached(args.cached);
    let output = ApplyPatchSaga::run(&ctx, request).await?;
    output::emit(
        env.format(),
        &ApplyReport {
            patch: args.patch,
            cached: output.cached,
        },
    )
}

fn read_patch(path: &Path) -> Result<String> {
    let read_error = |source| CliError::ReadPatch {
        path: path.to_path_buf(),
        source,
    };
    if path.as_os_str() == STDIN {
        let mut patch = String::new();
        std::io::stdin()
            .read_to_string(&mut patch)
            .map_err(read_error)?;
        Ok(patch)
    } else {
        std::fs::read_to_string(path).map_err(read_error)
    }
}
