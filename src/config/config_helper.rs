//! Configuration helper for interpreting config values.
//!
//! The `ConfigHelper` wraps a `Config` and turns its sections into the
//! values the repository and the merge engine take.

use super::{Config, Limit};
use crate::caches::DEFAULT_OBJECT_CACHE_SIZE;
use crate::merge::MergeTreeOptions;
use crate::repository::ObjectId;

/// Helper for interpreting configuration values.
#[derive(Debug, Clone)]
pub struct ConfigHelper {
    config: Config,
}

impl ConfigHelper {
    /// Create a new ConfigHelper wrapping the given config.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get a reference to the underlying config.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the helper and return the underlying config.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Object cache budget in bytes; zero disables the cache.
    pub fn object_cache_size(&self) -> usize {
        match &self.config.cache.max_size {
            Limit::Inherit => DEFAULT_OBJECT_CACHE_SIZE,
            Limit::Disabled => 0,
            Limit::Value(size) => usize::try_from(size.0).unwrap_or(usize::MAX),
        }
    }

    /// Merge options for the given trees with the configured defaults applied.
    pub fn merge_options(
        &self,
        our_oid: ObjectId,
        base_oid: ObjectId,
        their_oid: ObjectId,
    ) -> MergeTreeOptions {
        let merge = &self.config.merge;
        let mut options = MergeTreeOptions::new(our_oid, base_oid, their_oid);
        options.our_name = merge.our_name.clone();
        options.base_name = merge.base_name.clone();
        options.their_name = merge.their_name.clone();
        options.format = merge.conflict_style;
        options.marker_size = merge.marker_size;
        options.unreadable_content = merge.unreadable_content;
        options.conflict_resolver = merge.on_conflict.resolver();
        options
    }
}

impl From<Config> for ConfigHelper {
    fn from(config: Config) -> Self {
        Self::new(config)
    }
}
