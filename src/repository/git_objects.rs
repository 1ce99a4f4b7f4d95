//! Git object types for treemerge-rs storage.
//!
//! Every stored object is framed as `"<kind> <len>\0<data>"` and identified by
//! the hash of that framing. The hash depends on the repository's
//! [`ObjectFormat`]: sha-1 for ordinary git repositories, sha-256 for those
//! created with `--object-format=sha256`. Trees use git's binary encoding:
//! one `"<mode> <name>\0<raw id>"` record per entry, in canonical order.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Object ID is a hash represented as a lowercase hexadecimal string.
pub type ObjectId = String;

// =============================================================================
// Error Types
// =============================================================================

/// Errors raised while encoding or decoding objects.
#[derive(Debug, Error)]
pub enum ObjectError {
    #[error("malformed object header: {0}")]
    MalformedHeader(String),

    #[error("object length mismatch: header says {expected}, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("malformed tree: {0}")]
    MalformedTree(String),

    #[error("malformed commit: {0}")]
    MalformedCommit(String),

    #[error("duplicate tree entry '{0}'")]
    DuplicateEntry(String),

    #[error("unknown object kind '{0}'")]
    UnknownKind(String),

    #[error("unknown file mode '{0}'")]
    UnknownMode(String),

    #[error("unknown object format '{0}'")]
    UnknownFormat(String),

    #[error("invalid object id '{id}': {source}")]
    InvalidId {
        id: String,
        source: hex::FromHexError,
    },
}

/// Result type for object encoding operations.
pub type Result<T> = std::result::Result<T, ObjectError>;

// =============================================================================
// ObjectFormat
// =============================================================================

/// The hash function a repository names its objects with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFormat {
    #[default]
    Sha1,
    Sha256,
}

impl ObjectFormat {
    /// Name used by git's `extensions.objectformat`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectFormat::Sha1 => "sha1",
            ObjectFormat::Sha256 => "sha256",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(ObjectFormat::Sha1),
            "sha256" => Ok(ObjectFormat::Sha256),
            other => Err(ObjectError::UnknownFormat(other.to_string())),
        }
    }

    /// Length in bytes of a raw (binary) object id.
    pub fn raw_len(&self) -> usize {
        match self {
            ObjectFormat::Sha1 => 20,
            ObjectFormat::Sha256 => 32,
        }
    }

    /// Length of an object id in hex digits.
    pub fn hex_len(&self) -> usize {
        self.raw_len() * 2
    }

    /// Compute the id of already-framed object bytes.
    pub fn hash_framed(&self, framed: &[u8]) -> ObjectId {
        match self {
            ObjectFormat::Sha1 => hex::encode(Sha1::digest(framed)),
            ObjectFormat::Sha256 => hex::encode(Sha256::digest(framed)),
        }
    }

    /// Compute the id of an object without storing it.
    pub fn hash_object(&self, kind: ObjectKind, data: &[u8]) -> ObjectId {
        self.hash_framed(&frame_object(kind, data))
    }

    /// The id of the tree with no entries.
    pub fn empty_tree_id(&self) -> ObjectId {
        self.hash_object(ObjectKind::Tree, &[])
    }

    /// Whether `id` is a well-formed id in this format.
    pub fn is_valid_id(&self, id: &str) -> bool {
        id.len() == self.hex_len() && id.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl fmt::Display for ObjectFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ObjectKind
// =============================================================================

/// The type of a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// Name used in object headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(ObjectKind::Blob),
            "tree" => Ok(ObjectKind::Tree),
            "commit" => Ok(ObjectKind::Commit),
            other => Err(ObjectError::UnknownKind(other.to_string())),
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// FileMode
// =============================================================================

/// Permission and type bits of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileMode {
    /// `100644`
    Regular,
    /// `100755`
    Executable,
    /// `120000`
    Symlink,
    /// `40000`
    Directory,
    /// `160000`
    Gitlink,
}

impl FileMode {
    /// The octal form written into tree objects.
    pub fn as_octal(&self) -> &'static str {
        match self {
            FileMode::Regular => "100644",
            FileMode::Executable => "100755",
            FileMode::Symlink => "120000",
            FileMode::Directory => "40000",
            FileMode::Gitlink => "160000",
        }
    }

    /// Parse an octal mode. Directories are accepted with or without the
    /// leading zero.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "100644" | "644" => Ok(FileMode::Regular),
            "100755" | "755" => Ok(FileMode::Executable),
            "120000" => Ok(FileMode::Symlink),
            "40000" | "040000" => Ok(FileMode::Directory),
            "160000" => Ok(FileMode::Gitlink),
            other => Err(ObjectError::UnknownMode(other.to_string())),
        }
    }

    /// The kind of object an entry with this mode references.
    pub fn kind(&self) -> ObjectKind {
        match self {
            FileMode::Directory => ObjectKind::Tree,
            FileMode::Gitlink => ObjectKind::Commit,
            FileMode::Regular | FileMode::Executable | FileMode::Symlink => ObjectKind::Blob,
        }
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0>6}", self.as_octal())
    }
}

// =============================================================================
// Tree
// =============================================================================

/// One named child of a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub oid: ObjectId,
}

impl TreeEntry {
    pub fn kind(&self) -> ObjectKind {
        self.mode.kind()
    }
}

/// Compare two entries in canonical tree order.
///
/// Names are compared bytewise, with directory names treated as if they
/// ended in `/`.
pub fn compare_entries(a: &TreeEntry, b: &TreeEntry) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(entry: &TreeEntry) -> Vec<u8> {
    let mut key = entry.name.as_bytes().to_vec();
    if entry.mode == FileMode::Directory {
        key.push(b'/');
    }
    key
}

/// A directory: entries with unique names, kept in canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree, sorting the entries canonically.
    ///
    /// Returns `ObjectError::DuplicateEntry` if two entries share a name.
    pub fn new(mut entries: Vec<TreeEntry>) -> Result<Self> {
        entries.sort_by(compare_entries);
        let mut names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(ObjectError::DuplicateEntry(dup[0].to_string()));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<TreeEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Encode in git's binary tree format. Every id must belong to `format`.
    pub fn encode(&self, format: ObjectFormat) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for entry in &self.entries {
            let raw = hex::decode(&entry.oid).map_err(|source| ObjectError::InvalidId {
                id: entry.oid.clone(),
                source,
            })?;
            if raw.len() != format.raw_len() {
                return Err(ObjectError::MalformedTree(format!(
                    "entry '{}' has a {}-byte id",
                    entry.name,
                    raw.len()
                )));
            }
            out.extend_from_slice(entry.mode.as_octal().as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            out.extend_from_slice(&raw);
        }
        Ok(out)
    }

    /// Decode git's binary tree format with ids of the given format.
    pub fn decode(data: &[u8], format: ObjectFormat) -> Result<Self> {
        let raw_len = format.raw_len();
        let mut entries = Vec::new();
        let mut rest = data;

        while !rest.is_empty() {
            let space = rest
                .iter()
                .position(|b| *b == b' ')
                .ok_or_else(|| ObjectError::MalformedTree("missing mode separator".into()))?;
            let mode = std::str::from_utf8(&rest[..space])
                .map_err(|_| ObjectError::MalformedTree("non-ascii mode".into()))?;
            let mode = FileMode::parse(mode)?;
            rest = &rest[space + 1..];

            let nul = rest
                .iter()
                .position(|b| *b == 0)
                .ok_or_else(|| ObjectError::MalformedTree("missing name terminator".into()))?;
            let name = String::from_utf8(rest[..nul].to_vec())
                .map_err(|_| ObjectError::MalformedTree("entry name is not utf-8".into()))?;
            rest = &rest[nul + 1..];

            if rest.len() < raw_len {
                return Err(ObjectError::MalformedTree(format!(
                    "truncated id for entry '{}'",
                    name
                )));
            }
            let oid = hex::encode(&rest[..raw_len]);
            rest = &rest[raw_len..];

            entries.push(TreeEntry { mode, name, oid });
        }

        Self::new(entries)
    }
}

// =============================================================================
// StoredObject
// =============================================================================

/// A decoded object as read from storage: its kind and unframed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Arc<Vec<u8>>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self {
            kind,
            data: Arc::new(data),
        }
    }

    /// Memory footprint used for cache accounting.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

// =============================================================================
// Framing and Hashing
// =============================================================================

/// Frame object data with its `"<kind> <len>\0"` header.
pub fn frame_object(kind: ObjectKind, data: &[u8]) -> Vec<u8> {
    let mut out = format!("{} {}\0", kind.as_str(), data.len()).into_bytes();
    out.extend_from_slice(data);
    out
}

/// Split framed bytes back into kind and data.
pub fn parse_framed(framed: &[u8]) -> Result<(ObjectKind, &[u8])> {
    let nul = framed
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| ObjectError::MalformedHeader("missing header terminator".into()))?;
    let header = std::str::from_utf8(&framed[..nul])
        .map_err(|_| ObjectError::MalformedHeader("header is not utf-8".into()))?;
    let (kind, len) = header
        .split_once(' ')
        .ok_or_else(|| ObjectError::MalformedHeader(header.to_string()))?;
    let kind = ObjectKind::parse(kind)?;
    let expected: usize = len
        .parse()
        .map_err(|_| ObjectError::MalformedHeader(header.to_string()))?;
    let data = &framed[nul + 1..];
    if data.len() != expected {
        return Err(ObjectError::LengthMismatch {
            expected,
            actual: data.len(),
        });
    }
    Ok((kind, data))
}

/// Extract the root tree id from a commit object's data.
pub fn parse_commit_tree(data: &[u8], format: ObjectFormat) -> Result<ObjectId> {
    let text = std::str::from_utf8(data)
        .map_err(|_| ObjectError::MalformedCommit("commit is not utf-8".into()))?;
    let first = text.lines().next().unwrap_or_default();
    let id = first
        .strip_prefix("tree ")
        .ok_or_else(|| ObjectError::MalformedCommit("missing tree header".into()))?;
    if !format.is_valid_id(id) {
        return Err(ObjectError::MalformedCommit(format!("bad tree id '{}'", id)));
    }
    Ok(id.to_ascii_lowercase())
}
