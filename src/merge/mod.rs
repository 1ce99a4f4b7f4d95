//! Three-way merge of git trees.
//!
//! This module merges the trees "ours" and "theirs" against their common
//! ancestor "base" and produces the id of a new merged tree.
//!
//! # Overview
//!
//! The merge walks the three trees in parallel (see [`crate::walk`]). For each
//! path:
//!
//! 1. Decide whether ours and theirs changed the entry relative to base
//! 2. Pick an action from those two answers (keep base, take one side, remove,
//!    merge blob content, or fail as not supported)
//! 3. For blob content changed on both sides, run a line-based text merge and
//!    hand conflicts to a [`ConflictResolver`]
//!
//! Directories are then rebuilt bottom-up from the surviving children, and
//! directories left empty are pruned.
//!
//! # Key Functions
//!
//! - [`modified`] - Did one side change an entry relative to base
//! - [`changes_to_merge`] - Decide the action for one path
//! - [`merge_blobs`] - Merge blob content changed on both sides
//! - [`reduce_tree`] - Rebuild a directory from its merged children
//! - [`merge_tree`] - Merge three whole trees
//!
//! # Example
//!
//! ```ignore
//! use treemerge_rs::merge::{MergeTreeOptions, merge_tree};
//!
//! let mut options = MergeTreeOptions::new(ours, base, theirs);
//! options.conflict_resolver = Some(Arc::new(KeepMarkers));
//!
//! let tree = merge_tree(repo, options).await?;
//! println!("merged tree: {}", tree);
//! ```

mod blob;
mod context;
mod decision;
mod error;
mod merge_tree;
mod modified;
mod reduce;
mod resolver;
mod text;
mod types;

pub use blob::merge_blobs;
pub use context::MergeContext;
pub use decision::{changes_to_merge, merge_path};
pub use error::{MergeError, Result};
pub use merge_tree::{MergeTreeOptions, merge_tree};
pub use modified::modified;
pub use reduce::reduce_tree;
pub use resolver::{
    AbortOnConflict, ConflictResolver, DeleteConflicted, KeepMarkers, OnConflict, ResolveError,
};
pub use text::{
    ConflictStyle, DEFAULT_MARKER_SIZE, Merge3TextMerger, TextMergeInput, TextMergeOutput,
    TextMerger,
};
pub use types::{BlobMergeShape, EntryInfo, MergedEntry, PathMerge, TripleInfo, UnreadableContent};
