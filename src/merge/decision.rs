//! Per-path merge decisions.
//!
//! [`changes_to_merge`] classifies a path from the resolved entries of the
//! three sides; [`merge_path`] carries out that decision and produces the
//! result entry for the path.

use tracing::debug;

use crate::merge::blob::merge_blobs;
use crate::merge::context::MergeContext;
use crate::merge::error::{MergeError, Result};
use crate::merge::modified::modified;
use crate::merge::types::{BlobMergeShape, EntryInfo, MergedEntry, PathMerge, TripleInfo};
use crate::repository::{FileMode, ObjectKind};
use crate::walk::{MergeTriple, basename};

/// Determine the merge action for one path.
pub fn changes_to_merge(sides: &TripleInfo) -> PathMerge {
    let our_change = modified(&sides.ours, &sides.base);
    let their_change = modified(&sides.theirs, &sides.base);

    match (our_change, their_change) {
        (false, false) => PathMerge::KeepBase,
        (false, true) => PathMerge::TakeTheirs,
        (true, false) => PathMerge::TakeOurs,
        (true, true) => both_changed(sides),
    }
}

fn both_changed(sides: &TripleInfo) -> PathMerge {
    use ObjectKind::{Blob, Tree};

    // Link targets are not merged as text
    let any_symlink = [&sides.ours, &sides.base, &sides.theirs]
        .into_iter()
        .flatten()
        .any(|e| e.mode == FileMode::Symlink);

    let kind = |side: &Option<EntryInfo>| side.as_ref().map(|e| e.kind);

    match (kind(&sides.ours), kind(&sides.base), kind(&sides.theirs)) {
        (None, Some(_), None) => PathMerge::Remove,
        _ if any_symlink && sides.ours == sides.theirs => PathMerge::TakeOurs,
        _ if any_symlink => {
            PathMerge::NotSupported("symbolic link changed on both sides".to_string())
        }
        (Some(Blob), Some(Blob), Some(Blob)) => {
            PathMerge::MergeBlobs(BlobMergeShape::ModifyModify)
        }
        (Some(Blob), None, Some(Blob)) => PathMerge::MergeBlobs(BlobMergeShape::AddAdd),
        // Children are reconciled by the walk
        (Some(Tree), None, Some(Tree)) => PathMerge::TakeOurs,
        (Some(Blob), Some(_), None) => PathMerge::MergeBlobs(BlobMergeShape::ModifyDelete),
        (None, Some(_), Some(Blob)) => PathMerge::MergeBlobs(BlobMergeShape::DeleteModify),
        (ours, base, theirs) => PathMerge::NotSupported(format!(
            "both sides changed the entry: ours {}, base {}, theirs {}",
            describe_kind(ours),
            describe_kind(base),
            describe_kind(theirs)
        )),
    }
}

fn describe_kind(kind: Option<ObjectKind>) -> &'static str {
    match kind {
        Some(kind) => kind.as_str(),
        None => "absent",
    }
}

/// Merge one path of the walk and produce its result entry.
///
/// `None` means the path is omitted from its parent tree.
pub async fn merge_path(
    ctx: &MergeContext,
    path: &str,
    triple: &MergeTriple,
) -> Result<Option<MergedEntry>> {
    let sides = TripleInfo::describe(triple).await?;
    let decision = changes_to_merge(&sides);
    debug!(path, ?decision, "merge decision");

    let name = basename(path);
    let take = |side: &Option<EntryInfo>| side.as_ref().map(|e| MergedEntry::from_info(name, e));

    match decision {
        PathMerge::KeepBase => Ok(take(&sides.base)),
        PathMerge::TakeOurs => Ok(take(&sides.ours)),
        PathMerge::TakeTheirs => Ok(take(&sides.theirs)),
        PathMerge::Remove => Ok(None),
        PathMerge::MergeBlobs(shape) => merge_blobs(ctx, path, shape, triple, &sides).await,
        PathMerge::NotSupported(reason) => Err(MergeError::not_supported(path, reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(oid: &str) -> Option<EntryInfo> {
        Some(EntryInfo {
            kind: ObjectKind::Blob,
            mode: FileMode::Regular,
            oid: oid.to_string(),
        })
    }

    fn symlink(oid: &str) -> Option<EntryInfo> {
        Some(EntryInfo {
            kind: ObjectKind::Blob,
            mode: FileMode::Symlink,
            oid: oid.to_string(),
        })
    }

    fn tree(oid: &str) -> Option<EntryInfo> {
        Some(EntryInfo {
            kind: ObjectKind::Tree,
            mode: FileMode::Directory,
            oid: oid.to_string(),
        })
    }

    fn sides(
        ours: Option<EntryInfo>,
        base: Option<EntryInfo>,
        theirs: Option<EntryInfo>,
    ) -> TripleInfo {
        TripleInfo { ours, base, theirs }
    }

    #[test]
    fn test_unchanged_keeps_base() {
        let s = sides(blob("a"), blob("a"), blob("a"));
        assert_eq!(changes_to_merge(&s), PathMerge::KeepBase);
    }

    #[test]
    fn test_single_side_changes() {
        assert_eq!(
            changes_to_merge(&sides(blob("a"), blob("a"), blob("b"))),
            PathMerge::TakeTheirs
        );
        assert_eq!(
            changes_to_merge(&sides(blob("b"), blob("a"), blob("a"))),
            PathMerge::TakeOurs
        );
        // Deleted on one side only
        assert_eq!(
            changes_to_merge(&sides(None, blob("a"), blob("a"))),
            PathMerge::TakeOurs
        );
    }

    #[test]
    fn test_both_modified_blobs() {
        assert_eq!(
            changes_to_merge(&sides(blob("b"), blob("a"), blob("c"))),
            PathMerge::MergeBlobs(BlobMergeShape::ModifyModify)
        );
    }

    #[test]
    fn test_both_added() {
        assert_eq!(
            changes_to_merge(&sides(blob("b"), None, blob("c"))),
            PathMerge::MergeBlobs(BlobMergeShape::AddAdd)
        );
        assert_eq!(
            changes_to_merge(&sides(tree("t1"), None, tree("t2"))),
            PathMerge::TakeOurs
        );
    }

    #[test]
    fn test_both_deleted() {
        assert_eq!(
            changes_to_merge(&sides(None, blob("a"), None)),
            PathMerge::Remove
        );
        assert_eq!(
            changes_to_merge(&sides(None, tree("t"), None)),
            PathMerge::Remove
        );
    }

    #[test]
    fn test_modify_delete() {
        assert_eq!(
            changes_to_merge(&sides(blob("b"), blob("a"), None)),
            PathMerge::MergeBlobs(BlobMergeShape::ModifyDelete)
        );
        assert_eq!(
            changes_to_merge(&sides(None, blob("a"), blob("c"))),
            PathMerge::MergeBlobs(BlobMergeShape::DeleteModify)
        );
    }

    #[test]
    fn test_unsupported_shapes() {
        // Blob turned into a directory on one side, modified on the other
        let s = sides(tree("t"), blob("a"), blob("b"));
        assert!(matches!(changes_to_merge(&s), PathMerge::NotSupported(_)));

        // Added as a blob on one side and as a directory on the other
        let s = sides(blob("b"), None, tree("t"));
        match changes_to_merge(&s) {
            PathMerge::NotSupported(reason) => {
                assert!(reason.contains("ours blob"));
                assert!(reason.contains("base absent"));
                assert!(reason.contains("theirs tree"));
            }
            other => panic!("expected NotSupported, got {:?}", other),
        }
    }

    #[test]
    fn test_symlink_changed_on_both_sides_is_not_supported() {
        let shapes = [
            sides(symlink("b"), symlink("a"), symlink("c")),
            sides(symlink("b"), None, symlink("c")),
            sides(blob("b"), symlink("a"), blob("c")),
            sides(symlink("b"), symlink("a"), None),
        ];
        for s in shapes {
            match changes_to_merge(&s) {
                PathMerge::NotSupported(reason) => assert!(reason.contains("symbolic link")),
                other => panic!("expected NotSupported, got {:?}", other),
            }
        }

        // Identical or one-sided changes still go through
        assert_eq!(
            changes_to_merge(&sides(symlink("b"), symlink("a"), symlink("b"))),
            PathMerge::TakeOurs
        );
        assert_eq!(
            changes_to_merge(&sides(symlink("a"), symlink("a"), symlink("c"))),
            PathMerge::TakeTheirs
        );
        assert_eq!(
            changes_to_merge(&sides(None, symlink("a"), None)),
            PathMerge::Remove
        );
    }
}
