//! Parallel traversal of three trees.

mod tree_walker;
mod walker_entry;

pub use tree_walker::{RepoTreeWalker, TreeWalker, WalkVisitor, basename, join_path};
pub use walker_entry::{MergeTriple, RepoWalkerEntry, WalkerEntry};
