use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use tokio::fs;

use super::object_backend::{BackendError, ObjectBackend, Result};
use crate::repository::ObjectId;

/// Counter for generating unique temp file names.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Loose-object storage inside a git directory.
///
/// Objects live at `objects/<first two hex digits>/<remaining digits>`,
/// zlib-compressed. Writes are atomic: data is written to a temp file in
/// `objects/` then renamed into place. Packfiles are not read; a missing
/// object in a repository that has them reports `BackendError::Packed`.
pub struct FsBackend {
    git_dir: PathBuf,
}

impl FsBackend {
    /// Create a backend for the given git directory.
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    fn objects_dir(&self) -> PathBuf {
        self.git_dir.join("objects")
    }

    /// Path of the loose object file for an id.
    fn object_path(&self, id: &ObjectId) -> Result<PathBuf> {
        if id.len() < 3 || !id.is_ascii() {
            return Err(BackendError::Other(format!("invalid object id '{}'", id)));
        }
        let (dir, file) = id.split_at(2);
        Ok(self.objects_dir().join(dir).join(file))
    }

    /// Whether `objects/pack` holds any packfile.
    async fn has_packs(&self) -> bool {
        let Ok(mut entries) = fs::read_dir(self.objects_dir().join("pack")).await else {
            return false;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if entry.path().extension().is_some_and(|ext| ext == "pack") {
                return true;
            }
        }
        false
    }

    fn temp_file_path(&self) -> PathBuf {
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let pid = std::process::id();
        self.objects_dir()
            .join(format!("tmp_obj_{}_{}", pid, counter))
    }
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[async_trait]
impl ObjectBackend for FsBackend {
    async fn object_exists(&self, id: &ObjectId) -> Result<bool> {
        let path = self.object_path(id)?;
        Ok(fs::try_exists(&path).await?)
    }

    async fn read_object(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let path = self.object_path(id)?;
        let compressed = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(if self.has_packs().await {
                    BackendError::Packed
                } else {
                    BackendError::NotFound
                });
            }
            Err(e) => return Err(BackendError::Io(e)),
        };
        Ok(decompress(&compressed)?)
    }

    async fn write_object(&self, id: &ObjectId, framed: &[u8]) -> Result<()> {
        let path = self.object_path(id)?;
        if fs::try_exists(&path).await? {
            return Ok(());
        }

        let compressed = compress(framed)?;
        let temp_path = self.temp_file_path();

        fs::create_dir_all(self.objects_dir()).await?;
        fs::write(&temp_path, compressed).await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // A concurrent writer may have won the race; the content is identical.
        fs::rename(&temp_path, &path).await?;
        Ok(())
    }
}
