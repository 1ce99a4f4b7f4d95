//! Repository interface with caching and dry-run aware writes.
//!
//! This module provides the [`Repo`] struct which wraps a backend and cache
//! to provide a higher-level interface for object reads and writes.

mod create_repo;
#[allow(clippy::module_inception)]
mod repo;

pub use create_repo::{CreateRepoError, OpenRepo};
pub use repo::{Repo, RepoError, Result};
