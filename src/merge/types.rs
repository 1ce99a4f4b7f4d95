//! Type definitions for the three-way tree merge.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::repo;
use crate::repository::{FileMode, ObjectId, ObjectKind, TreeEntry};
use crate::walk::{MergeTriple, WalkerEntry};

// =============================================================================
// MergedEntry
// =============================================================================

/// A result entry produced for one path of the merge.
///
/// `path` is the name component only; the reducer uses it as the entry name
/// when it rebuilds the parent tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedEntry {
    pub mode: FileMode,
    pub path: String,
    pub oid: ObjectId,
    pub kind: ObjectKind,
}

impl MergedEntry {
    pub fn from_info(name: &str, info: &EntryInfo) -> Self {
        Self {
            mode: info.mode,
            path: name.to_string(),
            oid: info.oid.clone(),
            kind: info.kind,
        }
    }

    pub fn to_tree_entry(&self) -> TreeEntry {
        TreeEntry {
            mode: self.mode,
            name: self.path.clone(),
            oid: self.oid.clone(),
        }
    }
}

// =============================================================================
// EntryInfo
// =============================================================================

/// Resolved kind, mode and id of one side's entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub kind: ObjectKind,
    pub mode: FileMode,
    pub oid: ObjectId,
}

impl EntryInfo {
    pub async fn of(entry: &dyn WalkerEntry) -> repo::Result<Self> {
        let (kind, mode, oid) = tokio::try_join!(entry.kind(), entry.mode(), entry.oid())?;
        Ok(Self { kind, mode, oid })
    }

    pub fn is_blob(&self) -> bool {
        self.kind == ObjectKind::Blob
    }
}

/// [`EntryInfo`] for each side of a [`MergeTriple`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleInfo {
    pub ours: Option<EntryInfo>,
    pub base: Option<EntryInfo>,
    pub theirs: Option<EntryInfo>,
}

impl TripleInfo {
    /// Resolve the accessors of every present side.
    pub async fn describe(triple: &MergeTriple) -> repo::Result<Self> {
        let (ours, base, theirs) = tokio::try_join!(
            describe_side(&triple.ours),
            describe_side(&triple.base),
            describe_side(&triple.theirs),
        )?;
        Ok(Self { ours, base, theirs })
    }
}

async fn describe_side(side: &Option<Arc<dyn WalkerEntry>>) -> repo::Result<Option<EntryInfo>> {
    match side {
        Some(entry) => Ok(Some(EntryInfo::of(entry.as_ref()).await?)),
        None => Ok(None),
    }
}

// =============================================================================
// PathMerge
// =============================================================================

/// Which blob contents take part in a text merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobMergeShape {
    /// Base, ours and theirs are all blobs.
    ModifyModify,
    /// Both sides added a blob where base had nothing.
    AddAdd,
    /// Ours changed the blob, theirs deleted it.
    ModifyDelete,
    /// Ours deleted the blob, theirs changed it.
    DeleteModify,
}

/// The action chosen for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMerge {
    /// Neither side changed the entry.
    KeepBase,
    /// Only ours changed, or both added a directory.
    TakeOurs,
    /// Only theirs changed.
    TakeTheirs,
    /// Both deleted the entry.
    Remove,
    /// Both changed blob content.
    MergeBlobs(BlobMergeShape),
    /// Both changed the entry in a way that cannot be merged.
    NotSupported(String),
}

// =============================================================================
// UnreadableContent
// =============================================================================

/// What to do when a side's blob content cannot be read as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnreadableContent {
    /// Substitute empty text and log a warning.
    #[default]
    Empty,
    /// Fail the merge with [`MergeError::NotSupported`](super::MergeError::NotSupported).
    Fail,
}

impl UnreadableContent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "empty" => Some(UnreadableContent::Empty),
            "fail" => Some(UnreadableContent::Fail),
            _ => None,
        }
    }
}
