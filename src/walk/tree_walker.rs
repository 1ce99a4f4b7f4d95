//! Parallel traversal of the ours, base and theirs trees.
//!
//! The walk visits every path present in any of the three trees. At each
//! path it calls [`WalkVisitor::map`] with the triple of entries, then walks
//! the union of the children of whichever sides are trees, and finally calls
//! [`WalkVisitor::reduce`] with the mapped parent and the walked children.
//! Reduction is post-order; siblings are walked concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, try_join_all};
use tracing::trace;

use crate::merge::{MergedEntry, Result};
use crate::repo::Repo;
use crate::repository::{ObjectId, ObjectKind, TreeEntry};
use crate::walk::walker_entry::{MergeTriple, RepoWalkerEntry, WalkerEntry};

// =============================================================================
// Traits
// =============================================================================

/// Callbacks invoked by a [`TreeWalker`].
#[async_trait]
pub trait WalkVisitor: Send + Sync {
    /// Produce the result entry for one path, or `None` to omit it.
    async fn map(&self, path: &str, triple: &MergeTriple) -> Result<Option<MergedEntry>>;

    /// Combine a mapped parent with its already reduced children.
    async fn reduce(
        &self,
        parent: Option<MergedEntry>,
        children: Vec<Option<MergedEntry>>,
    ) -> Result<Option<MergedEntry>>;
}

/// Drives a three-tree traversal.
#[async_trait]
pub trait TreeWalker: Send + Sync {
    /// Walk `[ours, base, theirs]` and return the reduced root entry.
    async fn walk(
        &self,
        trees: [ObjectId; 3],
        visitor: &dyn WalkVisitor,
    ) -> Result<Option<MergedEntry>>;
}

// =============================================================================
// RepoTreeWalker
// =============================================================================

/// The default [`TreeWalker`], reading trees from a [`Repo`].
pub struct RepoTreeWalker {
    repo: Arc<Repo>,
}

impl RepoTreeWalker {
    pub fn new(repo: Arc<Repo>) -> Self {
        Self { repo }
    }

    fn walk_path<'a>(
        &'a self,
        path: String,
        triple: MergeTriple,
        visitor: &'a dyn WalkVisitor,
    ) -> BoxFuture<'a, Result<Option<MergedEntry>>> {
        async move {
            let parent = visitor.map(&path, &triple).await?;

            let children = self.child_triples(&path, &triple).await?;
            trace!(path = %path, children = children.len(), "walking children");

            let walked = try_join_all(
                children
                    .into_iter()
                    .map(|(child_path, child)| self.walk_path(child_path, child, visitor)),
            )
            .await?;

            visitor.reduce(parent, walked).await
        }
        .boxed()
    }

    /// Pair up the children of every side that is a tree, by name.
    async fn child_triples(
        &self,
        path: &str,
        triple: &MergeTriple,
    ) -> Result<Vec<(String, MergeTriple)>> {
        let sides = [&triple.ours, &triple.base, &triple.theirs];
        let mut slots: BTreeMap<String, [Option<TreeEntry>; 3]> = BTreeMap::new();

        for (i, side) in sides.into_iter().enumerate() {
            let Some(entry) = side else {
                continue;
            };
            if entry.kind().await? != ObjectKind::Tree {
                continue;
            }
            let tree = self.repo.read_tree(&entry.oid().await?).await?;
            for child in tree.into_entries() {
                let name = child.name.clone();
                slots.entry(name).or_default()[i] = Some(child);
            }
        }

        Ok(slots
            .into_iter()
            .map(|(name, [ours, base, theirs])| {
                let child_path = join_path(path, &name);
                let child = MergeTriple {
                    ours: self.to_walker_entry(&child_path, ours),
                    base: self.to_walker_entry(&child_path, base),
                    theirs: self.to_walker_entry(&child_path, theirs),
                };
                (child_path, child)
            })
            .collect())
    }

    fn to_walker_entry(
        &self,
        full_path: &str,
        entry: Option<TreeEntry>,
    ) -> Option<Arc<dyn WalkerEntry>> {
        entry.map(|e| {
            Arc::new(RepoWalkerEntry::new(
                Arc::clone(&self.repo),
                full_path.to_string(),
                e.mode,
                e.oid,
            )) as Arc<dyn WalkerEntry>
        })
    }
}

#[async_trait]
impl TreeWalker for RepoTreeWalker {
    async fn walk(
        &self,
        trees: [ObjectId; 3],
        visitor: &dyn WalkVisitor,
    ) -> Result<Option<MergedEntry>> {
        let [ours, base, theirs] = trees;
        let root = |oid: ObjectId| -> Option<Arc<dyn WalkerEntry>> {
            Some(Arc::new(RepoWalkerEntry::root(Arc::clone(&self.repo), oid)))
        };
        let triple = MergeTriple {
            ours: root(ours),
            base: root(base),
            theirs: root(theirs),
        };
        self.walk_path(".".to_string(), triple, visitor).await
    }
}

/// Join a child name onto a walk path.
pub fn join_path(parent: &str, name: &str) -> String {
    if parent == "." || parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Last component of a walk path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
