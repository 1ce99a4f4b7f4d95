//! Caches for repository object reads.

mod object_cache;

pub use object_cache::{DEFAULT_OBJECT_CACHE_SIZE, ObjectCache};
