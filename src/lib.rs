//! treemerge-rs - Three-way merge of git trees.
//!
//! The merge engine lives in [`merge`]; [`repo`] and [`backend`] provide the
//! object store it reads from and writes to.

pub mod backend;
pub mod caches;
pub mod cli;
pub mod config;
pub mod logging;
pub mod merge;
pub mod repo;
pub mod repository;
pub mod walk;

pub use merge::{
    ConflictResolver, MergeError, MergeTreeOptions, ResolveError, TextMerger, merge_tree,
};
pub use repo::{OpenRepo, Repo, RepoError};
pub use repository::{FileMode, ObjectId, ObjectKind, Tree, TreeEntry};
