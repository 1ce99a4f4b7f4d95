//! Conflict resolution callbacks.
//!
//! A [`ConflictResolver`] receives the conflict-marked text of a blob that
//! did not merge cleanly and decides what the merged content should be. An
//! empty result deletes the path; [`ResolveError::Aborted`] stops the whole
//! merge.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Errors a resolver can report.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Stop the merge.
    #[error("merge aborted by conflict resolver")]
    Aborted,

    /// The resolver could not produce content.
    #[error("conflict resolver failed: {0}")]
    Failed(String),
}

/// Resolves an unclean text merge.
#[async_trait]
pub trait ConflictResolver: Send + Sync {
    /// Return the resolved content for `path` given its conflict-marked text.
    async fn resolve(
        &self,
        conflicted: &str,
        path: &str,
    ) -> std::result::Result<String, ResolveError>;
}

// =============================================================================
// Built-in resolvers
// =============================================================================

/// Keeps the conflict markers in the merged blob.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeepMarkers;

#[async_trait]
impl ConflictResolver for KeepMarkers {
    async fn resolve(
        &self,
        conflicted: &str,
        _path: &str,
    ) -> std::result::Result<String, ResolveError> {
        Ok(conflicted.to_string())
    }
}

/// Deletes every path that conflicts.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeleteConflicted;

#[async_trait]
impl ConflictResolver for DeleteConflicted {
    async fn resolve(
        &self,
        _conflicted: &str,
        _path: &str,
    ) -> std::result::Result<String, ResolveError> {
        Ok(String::new())
    }
}

/// Aborts the merge on the first conflict.
#[derive(Debug, Default, Clone, Copy)]
pub struct AbortOnConflict;

#[async_trait]
impl ConflictResolver for AbortOnConflict {
    async fn resolve(
        &self,
        _conflicted: &str,
        _path: &str,
    ) -> std::result::Result<String, ResolveError> {
        Err(ResolveError::Aborted)
    }
}

// =============================================================================
// OnConflict
// =============================================================================

/// Named choice of built-in resolver, as used in configuration and the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnConflict {
    /// No resolver; conflicts fail the merge as not supported.
    #[default]
    Fail,
    KeepMarkers,
    Delete,
    Abort,
}

impl OnConflict {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fail" => Some(OnConflict::Fail),
            "keep-markers" => Some(OnConflict::KeepMarkers),
            "delete" => Some(OnConflict::Delete),
            "abort" => Some(OnConflict::Abort),
            _ => None,
        }
    }

    pub fn resolver(&self) -> Option<Arc<dyn ConflictResolver>> {
        match self {
            OnConflict::Fail => None,
            OnConflict::KeepMarkers => Some(Arc::new(KeepMarkers)),
            OnConflict::Delete => Some(Arc::new(DeleteConflicted)),
            OnConflict::Abort => Some(Arc::new(AbortOnConflict)),
        }
    }
}
