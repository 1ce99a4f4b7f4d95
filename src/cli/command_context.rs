//! Command context for CLI commands.
//!
//! Holds the resolved configuration and opens repositories, discovering the
//! git directory from the current working directory when none is given.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::cli::RepoArgs;
use crate::config::ConfigHelper;
use crate::repo::{CreateRepoError, OpenRepo, Repo};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during command context operations.
#[derive(Debug, Error)]
pub enum CommandContextError {
    /// No repository was given and none was found above the current directory.
    #[error("not in a git repository (searched upwards from {0})")]
    RepositoryRequired(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Opening the repository failed.
    #[error("{0}")]
    OpenRepo(#[from] CreateRepoError),
}

/// Result type for command context operations.
pub type Result<T> = std::result::Result<T, CommandContextError>;

// =============================================================================
// CommandContext
// =============================================================================

/// Shared state for running one command.
pub struct CommandContext {
    pub config: ConfigHelper,
    pub json: bool,
}

impl CommandContext {
    pub fn new(config: ConfigHelper, json: bool) -> Self {
        Self { config, json }
    }

    /// Open the repository named by `args`, or the one containing the
    /// current directory.
    pub fn open_repo(&self, args: &RepoArgs) -> Result<Arc<Repo>> {
        let mut spec = OpenRepo {
            dir: args.dir.clone(),
            git_dir: args.git_dir.clone(),
            cache_size: self.config.object_cache_size(),
        };

        if spec.dir.is_none() && spec.git_dir.is_none() {
            let cwd = std::env::current_dir()?;
            let git_dir = discover_git_dir(&cwd)
                .ok_or_else(|| CommandContextError::RepositoryRequired(cwd.clone()))?;
            debug!(git_dir = %git_dir.display(), "discovered repository");
            spec.git_dir = Some(git_dir);
        }

        Ok(Arc::new(Repo::open(&spec)?))
    }
}

/// Search `start` and its ancestors for a `.git` directory.
pub fn discover_git_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(".git"))
        .find(|candidate| candidate.is_dir())
}
