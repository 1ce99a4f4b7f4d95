//! Bottom-up reconstruction of merged trees.

use tracing::{debug, trace};

use crate::merge::error::Result;
use crate::merge::types::MergedEntry;
use crate::repo::Repo;
use crate::repository::{ObjectKind, Tree};

/// Combine a merged entry with its reduced children.
///
/// Absent children are dropped. A directory left with no children is pruned.
/// A directory with surviving children is rewritten from them and takes the
/// new tree's id. Children of an entry that is not a directory are dropped.
pub async fn reduce_tree(
    repo: &Repo,
    dry_run: bool,
    parent: Option<MergedEntry>,
    children: Vec<Option<MergedEntry>>,
) -> Result<Option<MergedEntry>> {
    let children: Vec<MergedEntry> = children.into_iter().flatten().collect();

    let Some(mut parent) = parent else {
        return Ok(None);
    };

    if parent.kind != ObjectKind::Tree {
        if !children.is_empty() {
            debug!(
                path = %parent.path,
                dropped = children.len(),
                "dropping children of a non-directory entry"
            );
        }
        return Ok(Some(parent));
    }

    if children.is_empty() {
        trace!(path = %parent.path, "pruning empty directory");
        return Ok(None);
    }

    let tree = Tree::new(children.iter().map(MergedEntry::to_tree_entry).collect())?;
    parent.oid = repo.write_tree(&tree, dry_run).await?;
    trace!(path = %parent.path, oid = %parent.oid, "rebuilt directory");

    Ok(Some(parent))
}
