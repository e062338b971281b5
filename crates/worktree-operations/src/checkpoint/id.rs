use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::OperationError;

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

/// Caller-supplied checkpoint name, checked to be usable as the last part of a ref name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CheckpointId(String);

impl CheckpointId {
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidCheckpointId`] if `id` cannot be part of a git ref name.
    pub fn new(id: impl Into<String>) -> Result<Self, OperationError> {
        let id = id.into();
        if let Some(reason) = invalid_reason(&id) {
            return Err(OperationError::InvalidCheckpointId { id, reason });
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn ref_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0)
    }

    /// Recovers the id from a full ref name, or `None` if the ref lies outside `prefix`.
    #[must_use]
    pub fn from_ref_name(name: &str, prefix: &str) -> Option<Self> {
        name.strip_prefix(prefix)
            .and_then(|id| Self::new(id).ok())
    }
}

fn invalid_reason(id: &str) -> Option<&'static str> {
    if id.is_empty() {
        return Some("must not be empty");
    }
    if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Some("must not contain whitespace or control characters");
    }
    if id.contains(FORBIDDEN_CHARS) {
        return Some("must not contain any of ~ ^ : ? * [ \\");
    }
    if id.starts_with('-') || id.starts_with('/') {
        return Some("must not start with '-' or '/'");
    }
    if id.contains("..") || id.contains("@{") || id.contains("//") {
        return Some("must not contain '..', '@{' or '//'");
    }
    if id.ends_with('/') || id.ends_with('.') || id.ends_with(".lock") {
        return Some("must not end with '/', '.' or '.lock'");
    }
    if id.split('/').any(|part| part.starts_with('.')) {
        return Some("path components must not start with '.'");
    }
    None
}

impl FromStr for CheckpointId {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CheckpointId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
