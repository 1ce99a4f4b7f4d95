//! Repository interface providing caching and dry-run aware object writes.
//!
//! The [`Repo`] struct wraps an [`ObjectBackend`] and adds:
//! - Framing, hashing and decoding of blob, tree and commit objects
//! - Read caching via [`ObjectCache`]
//! - Dry-run writes that compute ids without persisting anything
//! - The empty tree, which reads as present whether or not it was stored

use std::sync::Arc;

use tracing::trace;

use crate::backend::{BackendError, ObjectBackend};
use crate::caches::ObjectCache;
use crate::repository::{
    ObjectError, ObjectFormat, ObjectId, ObjectKind, StoredObject, Tree, frame_object,
    parse_commit_tree, parse_framed,
};

// =============================================================================
// Error Types
// =============================================================================

/// Error type for repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// The object was not found.
    NotFound(ObjectId),
    /// The object is not loose and the store has packfiles, which are not read.
    Packed(ObjectId),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The stored bytes could not be decoded.
    Object(ObjectError),
    /// Object type mismatch.
    TypeMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },
    /// A custom error message.
    Other(String),
}

impl std::fmt::Display for RepoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoError::NotFound(id) => write!(f, "object not found: {}", id),
            RepoError::Packed(id) => write!(
                f,
                "object not found: {} (only loose objects are read and this repository has \
                 packfiles; unpack them with `git unpack-objects` first)",
                id
            ),
            RepoError::Io(e) => write!(f, "I/O error: {}", e),
            RepoError::Object(e) => write!(f, "bad object: {}", e),
            RepoError::TypeMismatch {
                id,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "type mismatch for {}: expected {}, got {}",
                    id, expected, actual
                )
            }
            RepoError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RepoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RepoError::Io(e) => Some(e),
            RepoError::Object(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ObjectError> for RepoError {
    fn from(e: ObjectError) -> Self {
        RepoError::Object(e)
    }
}

/// Convert a backend error, attaching the id for not-found errors.
fn backend_error(id: &ObjectId, e: BackendError) -> RepoError {
    match e {
        BackendError::NotFound => RepoError::NotFound(id.clone()),
        BackendError::Packed => RepoError::Packed(id.clone()),
        BackendError::Io(io_err) => RepoError::Io(io_err),
        BackendError::Other(msg) => RepoError::Other(msg),
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepoError>;

// =============================================================================
// Repo
// =============================================================================

/// A content-addressed object repository.
///
/// Writes are pure functions of their content, so `Repo` can be shared
/// across concurrent merge tasks without locking.
pub struct Repo {
    backend: Arc<dyn ObjectBackend>,
    cache: Arc<ObjectCache>,
    format: ObjectFormat,
}

impl Repo {
    /// Create a new sha-1 repository with the given backend and cache.
    pub fn new<B>(backend: B, cache: ObjectCache) -> Self
    where
        B: ObjectBackend + 'static,
    {
        Self::from_dyn(Arc::new(backend), Arc::new(cache))
    }

    /// Create a new sha-1 repository from pre-wrapped trait objects.
    pub fn from_dyn(backend: Arc<dyn ObjectBackend>, cache: Arc<ObjectCache>) -> Self {
        Self {
            backend,
            cache,
            format: ObjectFormat::default(),
        }
    }

    /// Use `format` to name objects.
    pub fn with_format(mut self, format: ObjectFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ObjectFormat {
        self.format
    }

    /// Get the object cache.
    pub fn cache(&self) -> &Arc<ObjectCache> {
        &self.cache
    }

    /// The id of the tree with no entries in this repository's format.
    pub fn empty_tree_id(&self) -> ObjectId {
        self.format.empty_tree_id()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Check if an object exists in the repository.
    pub async fn object_exists(&self, id: &ObjectId) -> Result<bool> {
        if self.cache.get(id).await.is_some() || *id == self.empty_tree_id() {
            return Ok(true);
        }
        self.backend
            .object_exists(id)
            .await
            .map_err(|e| backend_error(id, e))
    }

    /// Read and decode an object of any kind.
    ///
    /// This operation checks the cache first.
    pub async fn read_object(&self, id: &ObjectId) -> Result<StoredObject> {
        if let Some(obj) = self.cache.get(id).await {
            return Ok(obj);
        }

        let obj = match self.backend.read_object(id).await {
            Ok(framed) => {
                let (kind, data) = parse_framed(&framed)?;
                StoredObject::new(kind, data.to_vec())
            }
            // Git treats the empty tree as always present
            Err(BackendError::NotFound | BackendError::Packed) if *id == self.empty_tree_id() => {
                StoredObject::new(ObjectKind::Tree, Vec::new())
            }
            Err(e) => return Err(backend_error(id, e)),
        };

        self.cache.put(id, &obj).await;
        Ok(obj)
    }

    async fn read_kind(&self, id: &ObjectId, expected: ObjectKind) -> Result<StoredObject> {
        let obj = self.read_object(id).await?;
        if obj.kind != expected {
            return Err(RepoError::TypeMismatch {
                id: id.clone(),
                expected,
                actual: obj.kind,
            });
        }
        Ok(obj)
    }

    /// Read a blob's content.
    pub async fn read_blob(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let obj = self.read_kind(id, ObjectKind::Blob).await?;
        Ok(obj.data.as_ref().clone())
    }

    /// Read and decode a tree.
    pub async fn read_tree(&self, id: &ObjectId) -> Result<Tree> {
        let obj = self.read_kind(id, ObjectKind::Tree).await?;
        Ok(Tree::decode(&obj.data, self.format)?)
    }

    /// Resolve an id to a tree id, following a commit to its root tree.
    pub async fn peel_to_tree(&self, id: &ObjectId) -> Result<ObjectId> {
        let obj = self.read_object(id).await?;
        match obj.kind {
            ObjectKind::Tree => Ok(id.clone()),
            ObjectKind::Commit => Ok(parse_commit_tree(&obj.data, self.format)?),
            actual => Err(RepoError::TypeMismatch {
                id: id.clone(),
                expected: ObjectKind::Tree,
                actual,
            }),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write an object and return its id.
    ///
    /// The id is a pure function of `kind` and `data`. With `dry_run` set the
    /// id is computed but nothing is stored.
    pub async fn write_object(
        &self,
        kind: ObjectKind,
        data: &[u8],
        dry_run: bool,
    ) -> Result<ObjectId> {
        let framed = frame_object(kind, data);
        let id = self.format.hash_framed(&framed);

        if dry_run {
            trace!(%id, %kind, "dry run, skipping write");
            return Ok(id);
        }

        self.backend
            .write_object(&id, &framed)
            .await
            .map_err(|e| backend_error(&id, e))?;
        trace!(%id, %kind, size = data.len(), "wrote object");
        Ok(id)
    }

    /// Encode and write a tree.
    pub async fn write_tree(&self, tree: &Tree, dry_run: bool) -> Result<ObjectId> {
        let data = tree.encode(self.format)?;
        self.write_object(ObjectKind::Tree, &data, dry_run).await
    }
}
