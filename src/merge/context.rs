//! Settings shared by every path of one merge.

use std::sync::Arc;

use crate::merge::resolver::ConflictResolver;
use crate::merge::text::{ConflictStyle, TextMerger};
use crate::merge::types::UnreadableContent;
use crate::repo::Repo;

/// Everything the per-path merge steps need, built once per merge.
pub struct MergeContext {
    pub repo: Arc<Repo>,
    pub text_merger: Arc<dyn TextMerger>,
    pub conflict_resolver: Option<Arc<dyn ConflictResolver>>,
    pub our_name: String,
    pub base_name: String,
    pub their_name: String,
    pub format: ConflictStyle,
    pub marker_size: usize,
    pub unreadable_content: UnreadableContent,
    pub dry_run: bool,
}
