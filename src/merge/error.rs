//! Error types for merge operations.

use crate::repo::RepoError;
use crate::repository::ObjectError;

// =============================================================================
// Error Types
// =============================================================================

/// Error type for merge operations.
#[derive(Debug)]
pub enum MergeError {
    /// The changes at `path` cannot be merged automatically.
    NotSupported { path: String, reason: String },
    /// The conflict resolver aborted the merge at `path`.
    Aborted { path: String },
    /// Repository error during merge.
    Repo(RepoError),
}

impl MergeError {
    pub fn not_supported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        MergeError::NotSupported {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The path the error is attributed to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            MergeError::NotSupported { path, .. } | MergeError::Aborted { path } => Some(path),
            MergeError::Repo(_) => None,
        }
    }
}

impl std::fmt::Display for MergeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeError::NotSupported { path, reason } => {
                write!(f, "merge not supported at '{}': {}", path, reason)
            }
            MergeError::Aborted { path } => write!(f, "merge aborted at '{}'", path),
            MergeError::Repo(e) => write!(f, "repository error: {}", e),
        }
    }
}

impl std::error::Error for MergeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MergeError::Repo(e) => Some(e),
            MergeError::NotSupported { .. } | MergeError::Aborted { .. } => None,
        }
    }
}

impl From<RepoError> for MergeError {
    fn from(e: RepoError) -> Self {
        MergeError::Repo(e)
    }
}

impl From<ObjectError> for MergeError {
    fn from(e: ObjectError) -> Self {
        MergeError::Repo(RepoError::Object(e))
    }
}

/// Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;
