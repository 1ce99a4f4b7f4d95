//! CLI subcommand implementations.

pub mod ls_tree;
pub mod merge_tree;
