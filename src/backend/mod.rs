mod fs_backend;
mod memory_backend;
mod object_backend;

pub use fs_backend::FsBackend;
pub use memory_backend::MemoryBackend;
pub use object_backend::{BackendError, ObjectBackend, Result};
