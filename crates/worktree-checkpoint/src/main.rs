mod commands;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use worktree_operations::config::WorktreeConfig;

use crate::commands::{CommandEnv, Commands};
use crate::error::{CliError, Result};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "worktree-checkpoint")]
#[command(about = "Checkpoint working trees and run git operations that roll back on failure", long_about = None)]
struct Cli {
    /// Working directory to operate on; repeat for several (default: current directory)
    #[arg(long = "path", short = 'C', global = true)]
    paths: Vec<PathBuf>,

    /// Config file (default: `.worktree-saga.toml` in the first directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Plain, global = true)]
    format: OutputFormat,

    /// Log saga steps as they run
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let directories = resolve_directories(cli.paths)?;
    let config = WorktreeConfig::load(cli.config.as_deref(), &directories[0])?;
    let env = CommandEnv::new(directories, config, cli.format);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    runtime.block_on(cli.command.execute(&env))
}

fn resolve_directories(paths: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        Ok(vec![std::env::current_dir().map_err(CliError::CurrentDir)?])
    } else {
        Ok(paths)
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
