//! Configuration types for treemerge-rs.
//!
//! This module defines the structures used to represent application configuration
//! as parsed from an INI-format config file.

use crate::merge::{ConflictStyle, OnConflict, UnreadableContent};

// =============================================================================
// Primitive Types
// =============================================================================

/// A byte size that can be parsed from strings like "100MB", "1GB", etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSize(pub u64);

/// A limit that can be inherited, disabled, or set.
///
/// - `Inherit`: Not specified in this layer; keep the value from the layer below
/// - `Disabled`: Explicitly set to "none"
/// - `Value(T)`: Specific limit value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit<T> {
    Inherit,
    Disabled,
    Value(T),
}

// =============================================================================
// Config Sections
// =============================================================================

/// [merge] section - defaults for tree merges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    pub our_name: String,
    pub base_name: String,
    pub their_name: String,
    pub conflict_style: ConflictStyle,
    pub marker_size: usize,
    pub unreadable_content: UnreadableContent,
    pub on_conflict: OnConflict,
}

/// [cache] section - in-memory object cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub max_size: Limit<ByteSize>,
}

/// [log] section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// A `tracing` filter directive such as "info" or "treemerge_rs=debug".
    pub level: String,
}

// =============================================================================
// Top-Level Config
// =============================================================================

/// Complete application configuration as parsed from config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub merge: MergeConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
}
