use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File looked up in a working directory when no explicit config path is given.
pub const CONFIG_FILE_NAME: &str = ".worktree-saga.toml";

pub const DEFAULT_GIT_PROGRAM: &str = "git";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_STASH_MESSAGE: &str = "worktree-saga: sync autostash";
pub const DEFAULT_REF_PREFIX: &str = "refs/worktree-checkpoints/";
pub const DEFAULT_MESSAGE_PREFIX: &str = "checkpoint:";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}'")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    program: String,
    remote: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            program: String::from(DEFAULT_GIT_PROGRAM),
            remote: String::from(DEFAULT_REMOTE),
        }
    }
}

impl GitSettings {
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Remote used by sync when the current branch has no upstream.
    #[must_use]
    pub fn remote(&self) -> &str {
        &self.remote
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    stash_message: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            stash_message: String::from(DEFAULT_STASH_MESSAGE),
        }
    }
}

impl SyncSettings {
    #[must_use]
    pub fn stash_message(&self) -> &str {
        &self.stash_message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckpointSettings {
    ref_prefix: String,
    message_prefix: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            ref_prefix: String::from(DEFAULT_REF_PREFIX),
            message_prefix: String::from(DEFAULT_MESSAGE_PREFIX),
        }
    }
}

impl CheckpointSettings {
    #[must_use]
    pub fn ref_prefix(&self) -> &str {
        &self.ref_prefix
    }

    #[must_use]
    pub fn message_prefix(&self) -> &str {
        &self.message_prefix
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorktreeConfig {
    git: GitSettings,
    sync: SyncSettings,
    checkpoint: CheckpointSettings,
}

impl WorktreeConfig {
    /// Loads `explicit` if given, otherwise `<dir>/.worktree-saga.toml` if it exists,
    /// otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the chosen file cannot be read, parsed or validated.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = dir.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Self =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a setting cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.program.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "git.program",
                reason: "must not be empty",
            });
        }
        if self.sync.stash_message.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "sync.stash_message",
                reason: "must not be empty",
            });
        }
        let prefix = &self.checkpoint.ref_prefix;
        if !prefix.starts_with("refs/") || !prefix.ends_with('/') || prefix.contains("..") {
            return Err(ConfigError::Invalid {
                field: "checkpoint.ref_prefix",
                reason: "must start with 'refs/' and end with '/'",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn git(&self) -> &GitSettings {
        &self.git
    }

    #[must_use]
    pub fn sync(&self) -> &SyncSettings {
        &self.sync
    }

    #[must_use]
    pub fn checkpoint(&self) -> &CheckpointSettings {
        &self.checkpoint
    }

    #[must_use]
    pub fn with_ref_prefix(mut self, prefix: &str) -> Self {
        self.checkpoint.ref_prefix = prefix.to_string();
        self
    }

    #[must_use]
    pub fn with_stash_message(mut self, message: &str) -> Self {
        self.sync.stash_message = message.to_string();
        self
    }
}
