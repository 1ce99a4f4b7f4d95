use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::object_backend::{BackendError, ObjectBackend, Result};
use crate::repository::ObjectId;

/// An in-memory implementation of `ObjectBackend`, intended primarily for testing.
pub struct MemoryBackend {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn object_count(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> BackendError {
    BackendError::Other("memory backend lock poisoned".to_string())
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    async fn object_exists(&self, id: &ObjectId) -> Result<bool> {
        let objects = self.objects.read().map_err(poisoned)?;
        Ok(objects.contains_key(id))
    }

    async fn read_object(&self, id: &ObjectId) -> Result<Vec<u8>> {
        let objects = self.objects.read().map_err(poisoned)?;
        objects.get(id).cloned().ok_or(BackendError::NotFound)
    }

    async fn write_object(&self, id: &ObjectId, framed: &[u8]) -> Result<()> {
        let mut objects = self.objects.write().map_err(poisoned)?;
        objects.insert(id.clone(), framed.to_vec());
        Ok(())
    }
}
