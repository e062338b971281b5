mod git;

pub use git::CliGitProvider;
