//! Lazily resolved views of one tree's entry at one path.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::repo::{Repo, Result};
use crate::repository::{FileMode, ObjectId, ObjectKind};

/// One tree's entry at the path being visited.
///
/// Accessors may need I/O against the object store, so they are async.
/// `content` fails for entries that are not blobs.
#[async_trait]
pub trait WalkerEntry: Send + Sync {
    /// Full path from the root of the walk, `"."` for the root itself.
    fn full_path(&self) -> &str;

    async fn kind(&self) -> Result<ObjectKind>;

    async fn mode(&self) -> Result<FileMode>;

    async fn oid(&self) -> Result<ObjectId>;

    /// Raw blob bytes.
    async fn content(&self) -> Result<Vec<u8>>;
}

/// The entries of ours, base and theirs at one path. `None` means the tree
/// has nothing at that path.
#[derive(Clone, Default)]
pub struct MergeTriple {
    pub ours: Option<Arc<dyn WalkerEntry>>,
    pub base: Option<Arc<dyn WalkerEntry>>,
    pub theirs: Option<Arc<dyn WalkerEntry>>,
}

impl MergeTriple {
    /// The path of the first present side, preferring base, then ours, then theirs.
    pub fn full_path(&self) -> Option<&str> {
        self.base
            .as_ref()
            .or(self.ours.as_ref())
            .or(self.theirs.as_ref())
            .map(|e| e.full_path())
    }
}

/// A [`WalkerEntry`] backed by a [`Repo`].
///
/// Mode and id come from the parent tree listing; blob content is read on
/// first use and kept for later calls.
pub struct RepoWalkerEntry {
    repo: Arc<Repo>,
    full_path: String,
    mode: FileMode,
    oid: ObjectId,
    content: OnceCell<Arc<Vec<u8>>>,
}

impl RepoWalkerEntry {
    pub fn new(repo: Arc<Repo>, full_path: String, mode: FileMode, oid: ObjectId) -> Self {
        Self {
            repo,
            full_path,
            mode,
            oid,
            content: OnceCell::new(),
        }
    }

    /// The entry for the root tree of a walk.
    pub fn root(repo: Arc<Repo>, oid: ObjectId) -> Self {
        Self::new(repo, ".".to_string(), FileMode::Directory, oid)
    }
}

#[async_trait]
impl WalkerEntry for RepoWalkerEntry {
    fn full_path(&self) -> &str {
        &self.full_path
    }

    async fn kind(&self) -> Result<ObjectKind> {
        Ok(self.mode.kind())
    }

    async fn mode(&self) -> Result<FileMode> {
        Ok(self.mode)
    }

    async fn oid(&self) -> Result<ObjectId> {
        Ok(self.oid.clone())
    }

    async fn content(&self) -> Result<Vec<u8>> {
        let content = self
            .content
            .get_or_try_init(|| async {
                let data = self.repo.read_blob(&self.oid).await?;
                Ok::<_, crate::repo::RepoError>(Arc::new(data))
            })
            .await?;
        Ok(content.as_ref().clone())
    }
}
