//! In-memory LRU cache of decoded objects.

use lru::LruCache;
use tokio::sync::Mutex;

use crate::repository::{ObjectId, StoredObject};

/// Default cache budget.
pub const DEFAULT_OBJECT_CACHE_SIZE: usize = 64 * 1024 * 1024;

struct CacheState {
    cache: LruCache<ObjectId, StoredObject>,
    current_size: usize,
}

/// LRU cache of objects read from a backend.
///
/// Size is accounted as object data length plus id length. Objects larger
/// than the budget are never cached; a budget of zero disables caching.
pub struct ObjectCache {
    state: Mutex<CacheState>,
    max_size: usize,
}

impl ObjectCache {
    /// Create a cache holding at most `max_size` bytes of object data.
    pub fn new(max_size: usize) -> Self {
        // Use an unbounded LRU since we manage size ourselves
        Self {
            state: Mutex::new(CacheState {
                cache: LruCache::unbounded(),
                current_size: 0,
            }),
            max_size,
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self::new(0)
    }

    fn entry_size(id: &ObjectId, obj: &StoredObject) -> usize {
        obj.size() + id.len()
    }

    pub async fn get(&self, id: &ObjectId) -> Option<StoredObject> {
        let mut state = self.state.lock().await;
        state.cache.get(id).cloned()
    }

    pub async fn put(&self, id: &ObjectId, obj: &StoredObject) {
        let size = Self::entry_size(id, obj);
        if size > self.max_size {
            return;
        }

        let mut state = self.state.lock().await;
        if let Some(old) = state.cache.pop(id) {
            state.current_size = state
                .current_size
                .saturating_sub(Self::entry_size(id, &old));
        }

        // Evict LRU entries until we have room
        while state.current_size + size > self.max_size {
            let lru = state.cache.pop_lru();
            match lru {
                Some((evicted_id, evicted)) => {
                    state.current_size = state
                        .current_size
                        .saturating_sub(Self::entry_size(&evicted_id, &evicted));
                }
                None => break,
            }
        }

        state.cache.put(id.clone(), obj.clone());
        state.current_size += size;
    }

    /// Number of cached objects.
    pub async fn len(&self) -> usize {
        self.state.lock().await.cache.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new(DEFAULT_OBJECT_CACHE_SIZE)
    }
}
