use async_trait::async_trait;

use crate::repository::ObjectId;

/// Error type for backend operations.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The object was not found.
    #[error("not found")]
    NotFound,

    /// The object is not stored loose, and the store holds packfiles that
    /// this backend does not read.
    #[error("not found as a loose object; packfiles are not read")]
    Packed,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A custom error message.
    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, BackendError>;

/// Storage for framed objects, keyed by object id.
///
/// Objects are immutable and content-addressed: writing the same id twice
/// must be harmless, and implementations must tolerate concurrent writes of
/// the same object.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Check if an object with the given ID exists.
    async fn object_exists(&self, id: &ObjectId) -> Result<bool>;

    /// Read an object's framed bytes by ID.
    ///
    /// Returns `BackendError::NotFound` if the object does not exist.
    async fn read_object(&self, id: &ObjectId) -> Result<Vec<u8>>;

    /// Write an object's framed bytes under the given ID.
    ///
    /// It is optional for implementations to verify that the ID matches the
    /// hash of the contents.
    async fn write_object(&self, id: &ObjectId, framed: &[u8]) -> Result<()>;
}
