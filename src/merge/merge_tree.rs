//! Three-way merge of whole trees.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::merge::context::MergeContext;
use crate::merge::decision::merge_path;
use crate::merge::error::Result;
use crate::merge::reduce::reduce_tree;
use crate::merge::resolver::ConflictResolver;
use crate::merge::text::{ConflictStyle, DEFAULT_MARKER_SIZE, Merge3TextMerger, TextMerger};
use crate::merge::types::{MergedEntry, UnreadableContent};
use crate::repo::Repo;
use crate::repository::ObjectId;
use crate::walk::{MergeTriple, RepoTreeWalker, TreeWalker, WalkVisitor};

// =============================================================================
// MergeTreeOptions
// =============================================================================

/// Inputs to [`merge_tree`].
#[derive(Clone)]
pub struct MergeTreeOptions {
    pub our_oid: ObjectId,
    pub base_oid: ObjectId,
    pub their_oid: ObjectId,
    /// Label for ours in conflict markers.
    pub our_name: String,
    pub base_name: String,
    pub their_name: String,
    /// Compute every id without writing any object.
    pub dry_run: bool,
    /// Called for blobs that do not merge cleanly. Without one, such
    /// conflicts fail the merge.
    pub conflict_resolver: Option<Arc<dyn ConflictResolver>>,
    /// Defaults to [`Merge3TextMerger`].
    pub text_merger: Option<Arc<dyn TextMerger>>,
    /// Defaults to a [`RepoTreeWalker`] over the merge's repository.
    pub walker: Option<Arc<dyn TreeWalker>>,
    pub format: ConflictStyle,
    pub marker_size: usize,
    pub unreadable_content: UnreadableContent,
}

impl MergeTreeOptions {
    pub fn new(our_oid: ObjectId, base_oid: ObjectId, their_oid: ObjectId) -> Self {
        Self {
            our_oid,
            base_oid,
            their_oid,
            our_name: "ours".to_string(),
            base_name: "base".to_string(),
            their_name: "theirs".to_string(),
            dry_run: false,
            conflict_resolver: None,
            text_merger: None,
            walker: None,
            format: ConflictStyle::default(),
            marker_size: DEFAULT_MARKER_SIZE,
            unreadable_content: UnreadableContent::default(),
        }
    }
}

// =============================================================================
// merge_tree
// =============================================================================

struct TreeMergeVisitor {
    ctx: MergeContext,
}

#[async_trait]
impl WalkVisitor for TreeMergeVisitor {
    async fn map(&self, path: &str, triple: &MergeTriple) -> Result<Option<MergedEntry>> {
        merge_path(&self.ctx, path, triple).await
    }

    async fn reduce(
        &self,
        parent: Option<MergedEntry>,
        children: Vec<Option<MergedEntry>>,
    ) -> Result<Option<MergedEntry>> {
        reduce_tree(&self.ctx.repo, self.ctx.dry_run, parent, children).await
    }
}

/// Merge the trees `ours` and `theirs` against their common ancestor `base`
/// and return the id of the merged tree.
///
/// Objects created along the way are written as they are produced. A failed
/// merge may therefore leave unreferenced objects in the store; they are
/// never referenced by any tree and are safe to garbage collect.
///
/// If every entry is removed, the result is the empty tree's id. The empty
/// tree itself is not written; [`Repo`] reads it as always present.
pub async fn merge_tree(repo: Arc<Repo>, options: MergeTreeOptions) -> Result<ObjectId> {
    info!(
        ours = %options.our_oid,
        base = %options.base_oid,
        theirs = %options.their_oid,
        dry_run = options.dry_run,
        "merging trees"
    );

    let walker: Arc<dyn TreeWalker> = match options.walker {
        Some(walker) => walker,
        None => Arc::new(RepoTreeWalker::new(Arc::clone(&repo))),
    };
    let text_merger: Arc<dyn TextMerger> = match options.text_merger {
        Some(merger) => merger,
        None => Arc::new(Merge3TextMerger),
    };

    let empty_tree = repo.empty_tree_id();
    let visitor = TreeMergeVisitor {
        ctx: MergeContext {
            repo,
            text_merger,
            conflict_resolver: options.conflict_resolver,
            our_name: options.our_name,
            base_name: options.base_name,
            their_name: options.their_name,
            format: options.format,
            marker_size: options.marker_size,
            unreadable_content: options.unreadable_content,
            dry_run: options.dry_run,
        },
    };

    let root = walker
        .walk(
            [options.our_oid, options.base_oid, options.their_oid],
            &visitor,
        )
        .await?;

    let tree = match root {
        Some(entry) => entry.oid,
        None => empty_tree,
    };
    info!(%tree, "merge complete");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, ObjectBackend};
    use crate::caches::ObjectCache;
    use crate::merge::resolver::{DeleteConflicted, KeepMarkers, ResolveError};
    use crate::merge::text::{TextMergeInput, TextMergeOutput};
    use crate::merge::MergeError;
    use crate::repository::{FileMode, ObjectKind, Tree, TreeEntry};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // =========================================================================
    // Helpers
    // =========================================================================

    struct TestRepo {
        backend: Arc<MemoryBackend>,
        repo: Arc<Repo>,
    }

    fn create_test_repo() -> TestRepo {
        let backend = Arc::new(MemoryBackend::new());
        let repo = Arc::new(Repo::from_dyn(
            Arc::clone(&backend) as Arc<dyn ObjectBackend>,
            Arc::new(ObjectCache::default()),
        ));
        TestRepo { backend, repo }
    }

    /// A node in a test tree description.
    enum Node {
        File(FileMode, &'static str),
        Dir(Vec<(&'static str, Node)>),
    }

    fn file(content: &'static str) -> Node {
        Node::File(FileMode::Regular, content)
    }

    fn exec(content: &'static str) -> Node {
        Node::File(FileMode::Executable, content)
    }

    fn dir(entries: Vec<(&'static str, Node)>) -> Node {
        Node::Dir(entries)
    }

    fn write_node<'a>(
        repo: &'a Repo,
        node: &'a Node,
    ) -> futures::future::BoxFuture<'a, (FileMode, ObjectId)> {
        use futures::FutureExt;
        async move {
            match node {
                Node::File(mode, content) => {
                    let oid = repo
                        .write_object(ObjectKind::Blob, content.as_bytes(), false)
                        .await
                        .unwrap();
                    (*mode, oid)
                }
                Node::Dir(entries) => {
                    let mut tree_entries = Vec::new();
                    for (name, child) in entries {
                        let (mode, oid) = write_node(repo, child).await;
                        tree_entries.push(TreeEntry {
                            mode,
                            name: name.to_string(),
                            oid,
                        });
                    }
                    let tree = Tree::new(tree_entries).unwrap();
                    (
                        FileMode::Directory,
                        repo.write_tree(&tree, false).await.unwrap(),
                    )
                }
            }
        }
        .boxed()
    }

    async fn write_root(repo: &Repo, entries: Vec<(&'static str, Node)>) -> ObjectId {
        write_node(repo, &Node::Dir(entries)).await.1
    }

    /// Flatten a tree into `path -> (mode, oid)` for every blob.
    fn flatten<'a>(
        repo: &'a Repo,
        oid: &'a ObjectId,
        prefix: String,
        out: &'a mut BTreeMap<String, (FileMode, ObjectId)>,
    ) -> futures::future::BoxFuture<'a, ()> {
        use futures::FutureExt;
        async move {
            let tree = repo.read_tree(oid).await.unwrap();
            for entry in tree.entries() {
                let path = format!("{}{}", prefix, entry.name);
                if entry.mode == FileMode::Directory {
                    flatten(repo, &entry.oid, format!("{}/", path), out).await;
                } else {
                    out.insert(path, (entry.mode, entry.oid.clone()));
                }
            }
        }
        .boxed()
    }

    async fn files(repo: &Repo, oid: &ObjectId) -> BTreeMap<String, (FileMode, ObjectId)> {
        let mut out = BTreeMap::new();
        flatten(repo, oid, String::new(), &mut out).await;
        out
    }

    async fn blob_text(repo: &Repo, oid: &ObjectId) -> String {
        String::from_utf8(repo.read_blob(oid).await.unwrap()).unwrap()
    }

    /// Counts calls and delegates to the default text merger.
    #[derive(Default)]
    struct CountingTextMerger {
        calls: AtomicUsize,
    }

    impl TextMerger for CountingTextMerger {
        fn merge(&self, input: &TextMergeInput<'_>) -> TextMergeOutput {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Merge3TextMerger.merge(input)
        }
    }

    /// Records what it was asked to resolve and returns a fixed answer.
    struct RecordingResolver {
        answer: std::result::Result<String, ()>,
        seen: Mutex<Vec<(String, String)>>,
    }

    impl RecordingResolver {
        fn returning(answer: &str) -> Self {
            Self {
                answer: Ok(answer.to_string()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn aborting() -> Self {
            Self {
                answer: Err(()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ConflictResolver for RecordingResolver {
        async fn resolve(
            &self,
            conflicted: &str,
            path: &str,
        ) -> std::result::Result<String, ResolveError> {
            self.seen
                .lock()
                .unwrap()
                .push((conflicted.to_string(), path.to_string()));
            match &self.answer {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(ResolveError::Aborted),
            }
        }
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_unchanged_path_keeps_base_entry() {
        let t = create_test_repo();
        let entries = || {
            vec![
                ("a.txt", file("a\n")),
                ("run.sh", exec("#!/bin/sh\n")),
                ("sub", dir(vec![("b.txt", file("b\n"))])),
            ]
        };
        let base = write_root(&t.repo, entries()).await;
        let ours = write_root(&t.repo, entries()).await;
        let theirs = write_root(&t.repo, entries()).await;
        let before = t.backend.object_count();

        let merged = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(ours, base.clone(), theirs),
        )
        .await
        .unwrap();

        assert_eq!(merged, base);
        assert_eq!(t.backend.object_count(), before);
    }

    #[tokio::test]
    async fn test_single_side_changes() {
        let t = create_test_repo();
        let base = write_root(
            &t.repo,
            vec![("a.txt", file("a\n")), ("b.txt", file("b\n"))],
        )
        .await;
        let ours = write_root(
            &t.repo,
            vec![("a.txt", file("a\n")), ("b.txt", file("b ours\n"))],
        )
        .await;
        let theirs = write_root(
            &t.repo,
            vec![("a.txt", exec("a theirs\n")), ("b.txt", file("b\n"))],
        )
        .await;

        let merged = merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs))
            .await
            .unwrap();
        let result = files(&t.repo, &merged).await;

        let (a_mode, a_oid) = &result["a.txt"];
        assert_eq!(*a_mode, FileMode::Executable);
        assert_eq!(blob_text(&t.repo, a_oid).await, "a theirs\n");
        let (b_mode, b_oid) = &result["b.txt"];
        assert_eq!(*b_mode, FileMode::Regular);
        assert_eq!(blob_text(&t.repo, b_oid).await, "b ours\n");
    }

    #[tokio::test]
    async fn test_identical_change_skips_text_merge() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("f.txt", file("old\n"))]).await;
        let ours = write_root(&t.repo, vec![("f.txt", file("new\n"))]).await;
        let theirs = write_root(&t.repo, vec![("f.txt", file("new\n"))]).await;

        let merger = Arc::new(CountingTextMerger::default());
        let mut options = MergeTreeOptions::new(ours.clone(), base, theirs);
        options.text_merger = Some(Arc::clone(&merger) as Arc<dyn TextMerger>);

        let merged = merge_tree(Arc::clone(&t.repo), options).await.unwrap();

        assert_eq!(merged, ours);
        assert_eq!(merger.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_independent_additions() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("keep", file("k\n"))]).await;

        // Same content on both sides: no conflict
        let ours =
            write_root(&t.repo, vec![("keep", file("k\n")), ("new", file("same\n"))]).await;
        let theirs =
            write_root(&t.repo, vec![("keep", file("k\n")), ("new", file("same\n"))]).await;
        let merged = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(ours, base.clone(), theirs),
        )
        .await
        .unwrap();
        let result = files(&t.repo, &merged).await;
        assert_eq!(blob_text(&t.repo, &result["new"].1).await, "same\n");

        // Different content: the resolver is consulted with no base text
        let ours =
            write_root(&t.repo, vec![("keep", file("k\n")), ("new", file("ours\n"))]).await;
        let theirs =
            write_root(&t.repo, vec![("keep", file("k\n")), ("new", file("theirs\n"))]).await;
        let resolver = Arc::new(RecordingResolver::returning("ours\ntheirs\n"));
        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.conflict_resolver = Some(Arc::clone(&resolver) as Arc<dyn ConflictResolver>);
        options.format = ConflictStyle::Diff3;

        let merged = merge_tree(Arc::clone(&t.repo), options).await.unwrap();
        let result = files(&t.repo, &merged).await;
        assert_eq!(blob_text(&t.repo, &result["new"].1).await, "ours\ntheirs\n");

        let seen = resolver.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].0,
            "<<<<<<< ours\nours\n||||||| base\n=======\ntheirs\n>>>>>>> theirs\n"
        );
        assert_eq!(seen[0].1, "new");
    }

    #[tokio::test]
    async fn test_both_deleted() {
        let t = create_test_repo();
        let base = write_root(
            &t.repo,
            vec![("gone.txt", file("bye\n")), ("stay.txt", file("hi\n"))],
        )
        .await;
        let ours = write_root(&t.repo, vec![("stay.txt", file("hi\n"))]).await;
        let theirs = write_root(&t.repo, vec![("stay.txt", file("hi\n"))]).await;
        let before = t.backend.object_count();

        let merged = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(ours.clone(), base, theirs),
        )
        .await
        .unwrap();

        assert_eq!(merged, ours);
        assert!(!files(&t.repo, &merged).await.contains_key("gone.txt"));
        assert_eq!(t.backend.object_count(), before);
    }

    #[tokio::test]
    async fn test_emptied_directory_is_pruned() {
        let t = create_test_repo();
        let base = write_root(
            &t.repo,
            vec![
                ("top.txt", file("top\n")),
                (
                    "dir",
                    dir(vec![("one.txt", file("1\n")), ("two.txt", file("2\n"))]),
                ),
            ],
        )
        .await;
        // Ours deletes one file, theirs deletes the other
        let ours = write_root(
            &t.repo,
            vec![
                ("top.txt", file("top\n")),
                ("dir", dir(vec![("two.txt", file("2\n"))])),
            ],
        )
        .await;
        let theirs = write_root(
            &t.repo,
            vec![
                ("top.txt", file("top\n")),
                ("dir", dir(vec![("one.txt", file("1\n"))])),
            ],
        )
        .await;

        let merged = merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs))
            .await
            .unwrap();

        let tree = t.repo.read_tree(&merged).await.unwrap();
        assert!(tree.get("dir").is_none());
        assert!(tree.get("top.txt").is_some());
    }

    #[tokio::test]
    async fn test_everything_removed_gives_empty_tree() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("only.txt", file("x\n"))]).await;
        let empty = t.repo.empty_tree_id();

        let merged = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(empty.clone(), base, empty.clone()),
        )
        .await
        .unwrap();
        assert_eq!(merged, empty);
        assert!(t.repo.read_tree(&merged).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_result_is_readable_without_being_written() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("f", file("A\n"))]).await;
        let ours = write_root(&t.repo, vec![("f", file("A\nB\n"))]).await;
        let theirs = write_root(&t.repo, vec![("f", file("A\nC\n"))]).await;

        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.conflict_resolver = Some(Arc::new(DeleteConflicted));
        let merged = merge_tree(Arc::clone(&t.repo), options).await.unwrap();

        assert_eq!(merged, t.repo.empty_tree_id());
        assert!(t.repo.read_tree(&merged).await.unwrap().is_empty());

        // The result is usable as an input to another merge
        let again = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(merged.clone(), merged.clone(), merged.clone()),
        )
        .await
        .unwrap();
        assert_eq!(again, merged);
    }

    #[tokio::test]
    async fn test_mode_inheritance() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("tool", file("v1\n"))]).await;
        let ours = write_root(&t.repo, vec![("tool", file("v2\n"))]).await;
        let theirs = write_root(&t.repo, vec![("tool", exec("v2\n"))]).await;

        let merged = merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs))
            .await
            .unwrap();
        let result = files(&t.repo, &merged).await;

        let (mode, oid) = &result["tool"];
        assert_eq!(*mode, FileMode::Executable);
        assert_eq!(mode.to_string(), "100755");
        assert_eq!(blob_text(&t.repo, oid).await, "v2\n");
    }

    #[tokio::test]
    async fn test_conflict_then_resolve() {
        let t = create_test_repo();
        let base =
            write_root(&t.repo, vec![("doc", dir(vec![("f.txt", file("A\n"))]))]).await;
        let ours =
            write_root(&t.repo, vec![("doc", dir(vec![("f.txt", file("A\nB\n"))]))]).await;
        let theirs =
            write_root(&t.repo, vec![("doc", dir(vec![("f.txt", file("A\nC\n"))]))]).await;

        let merger = Arc::new(CountingTextMerger::default());
        let resolver = Arc::new(RecordingResolver::returning("A\nB\nC\n"));
        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.our_name = "main".to_string();
        options.their_name = "feature".to_string();
        options.text_merger = Some(Arc::clone(&merger) as Arc<dyn TextMerger>);
        options.conflict_resolver = Some(Arc::clone(&resolver) as Arc<dyn ConflictResolver>);

        let merged = merge_tree(Arc::clone(&t.repo), options).await.unwrap();

        assert_eq!(merger.calls.load(Ordering::SeqCst), 1);
        let seen = resolver.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        let (conflicted, path) = &seen[0];
        assert_eq!(path, "doc/f.txt");
        assert!(conflicted.contains("<<<<<<< main"));
        assert!(conflicted.contains(">>>>>>> feature"));

        let result = files(&t.repo, &merged).await;
        let (_, oid) = &result["doc/f.txt"];
        assert_eq!(blob_text(&t.repo, oid).await, "A\nB\nC\n");
    }

    #[tokio::test]
    async fn test_resolver_returns_empty_deletes_path() {
        let t = create_test_repo();
        let base = write_root(
            &t.repo,
            vec![("f.txt", file("A\n")), ("g.txt", file("g\n"))],
        )
        .await;
        let ours = write_root(
            &t.repo,
            vec![("f.txt", file("A\nB\n")), ("g.txt", file("g\n"))],
        )
        .await;
        let theirs = write_root(
            &t.repo,
            vec![("f.txt", file("A\nC\n")), ("g.txt", file("g\n"))],
        )
        .await;
        let before = t.backend.object_count();

        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.conflict_resolver = Some(Arc::new(RecordingResolver::returning("")));
        let merged = merge_tree(Arc::clone(&t.repo), options).await.unwrap();

        let result = files(&t.repo, &merged).await;
        assert!(!result.contains_key("f.txt"));
        assert!(result.contains_key("g.txt"));
        // Only the new root tree was written
        assert_eq!(t.backend.object_count(), before + 1);
    }

    #[tokio::test]
    async fn test_resolver_abort_fails_whole_merge() {
        let t = create_test_repo();
        let base = write_root(
            &t.repo,
            vec![("clean.txt", file("1\n2\n3\n")), ("f.txt", file("A\n"))],
        )
        .await;
        let ours = write_root(
            &t.repo,
            vec![("clean.txt", file("one\n2\n3\n")), ("f.txt", file("A\nB\n"))],
        )
        .await;
        let theirs = write_root(
            &t.repo,
            vec![("clean.txt", file("1\n2\nthree\n")), ("f.txt", file("A\nC\n"))],
        )
        .await;

        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.conflict_resolver = Some(Arc::new(RecordingResolver::aborting()));
        let result = merge_tree(Arc::clone(&t.repo), options).await;

        match result {
            Err(MergeError::Aborted { path }) => assert_eq!(path, "f.txt"),
            other => panic!("expected Aborted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_is_idempotent_and_writes_nothing() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("f.txt", file("A\n"))]).await;
        let ours = write_root(
            &t.repo,
            vec![("f.txt", file("A\nB\n")), ("x", dir(vec![("o", file("o\n"))]))],
        )
        .await;
        let theirs = write_root(&t.repo, vec![("f.txt", file("A\nC\n"))]).await;
        let before = t.backend.object_count();

        let options = || {
            let mut options = MergeTreeOptions::new(ours.clone(), base.clone(), theirs.clone());
            options.dry_run = true;
            options.conflict_resolver = Some(Arc::new(KeepMarkers));
            options
        };

        let first = merge_tree(Arc::clone(&t.repo), options()).await.unwrap();
        let second = merge_tree(Arc::clone(&t.repo), options()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(t.backend.object_count(), before);
        assert!(!t.repo.object_exists(&first).await.unwrap());

        // A real run produces the same id
        let mut wet = options();
        wet.dry_run = false;
        let written = merge_tree(Arc::clone(&t.repo), wet).await.unwrap();
        assert_eq!(written, first);
        assert!(t.repo.object_exists(&written).await.unwrap());
    }

    #[tokio::test]
    async fn test_blob_to_directory_against_modified_blob_is_not_supported() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("thing", file("v1\n"))]).await;
        let ours =
            write_root(&t.repo, vec![("thing", dir(vec![("inner", file("i\n"))]))]).await;
        let theirs = write_root(&t.repo, vec![("thing", file("v2\n"))]).await;

        let result =
            merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs)).await;
        match result {
            Err(MergeError::NotSupported { path, .. }) => assert_eq!(path, "thing"),
            other => panic!("expected NotSupported, got {:?}", other),
        }
    }

    /// Ours replaces a blob with a directory while theirs leaves the blob
    /// alone, so the merge deliberately takes ours' directory.
    #[tokio::test]
    async fn test_blob_to_directory_with_other_side_unchanged_takes_directory() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("thing", file("v1\n"))]).await;
        let ours =
            write_root(&t.repo, vec![("thing", dir(vec![("inner", file("i\n"))]))]).await;
        let theirs = write_root(&t.repo, vec![("thing", file("v1\n"))]).await;

        let merged = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(ours.clone(), base, theirs),
        )
        .await
        .unwrap();
        assert_eq!(merged, ours);
    }

    #[tokio::test]
    async fn test_symlink_retargeted_on_both_sides_is_not_supported() {
        let t = create_test_repo();
        let link = |target| Node::File(FileMode::Symlink, target);
        let base = write_root(&t.repo, vec![("current", link("v1"))]).await;
        let ours = write_root(&t.repo, vec![("current", link("v2"))]).await;
        let theirs = write_root(&t.repo, vec![("current", link("v3"))]).await;

        // Even a resolver that would accept any text is never consulted
        let resolver = Arc::new(RecordingResolver::returning("v2v3"));
        let mut options = MergeTreeOptions::new(ours, base, theirs);
        options.conflict_resolver = Some(Arc::clone(&resolver) as Arc<dyn ConflictResolver>);
        let result = merge_tree(Arc::clone(&t.repo), options).await;

        match result {
            Err(MergeError::NotSupported { path, .. }) => assert_eq!(path, "current"),
            other => panic!("expected NotSupported, got {:?}", other),
        }
        assert!(resolver.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conflict_without_resolver_is_not_supported() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("f.txt", file("A\n"))]).await;
        let ours = write_root(&t.repo, vec![("f.txt", file("A\nB\n"))]).await;
        let theirs = write_root(&t.repo, vec![("f.txt", file("A\nC\n"))]).await;

        let result =
            merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs)).await;
        assert!(matches!(result, Err(MergeError::NotSupported { .. })));
    }

    #[tokio::test]
    async fn test_directories_added_on_both_sides_merge_children() {
        let t = create_test_repo();
        let base = write_root(&t.repo, vec![("readme", file("r\n"))]).await;
        let ours = write_root(
            &t.repo,
            vec![
                ("readme", file("r\n")),
                ("lib", dir(vec![("a.rs", file("a\n"))])),
            ],
        )
        .await;
        let theirs = write_root(
            &t.repo,
            vec![
                ("readme", file("r\n")),
                ("lib", dir(vec![("b.rs", file("b\n"))])),
            ],
        )
        .await;

        let merged = merge_tree(Arc::clone(&t.repo), MergeTreeOptions::new(ours, base, theirs))
            .await
            .unwrap();
        let result = files(&t.repo, &merged).await;
        let paths: Vec<&str> = result.keys().map(String::as_str).collect();
        assert_eq!(paths, vec!["lib/a.rs", "lib/b.rs", "readme"]);
    }

    #[tokio::test]
    async fn test_missing_tree_is_repo_error() {
        let t = create_test_repo();
        let missing = "ab".repeat(20);
        let result = merge_tree(
            Arc::clone(&t.repo),
            MergeTreeOptions::new(missing.clone(), missing.clone(), missing),
        )
        .await;
        assert!(matches!(result, Err(MergeError::Repo(_))));
    }
}
