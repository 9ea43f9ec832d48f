//! Best-effort in-memory resource cache
//!
//! Entries are keyed by the URL they were downloaded from. Nothing is
//! persisted and no entry is guaranteed to survive: an implementation may
//! drop anything at any time. A miss is never an error.

mod memory;

pub use memory::MemoryCache;

use bytes::Bytes;

/// Shared URL → bytes store used by the data service.
///
/// Implementations must tolerate concurrent `get`/`put` from the issuing
/// thread and from arbitrary completion threads.
pub trait ResourceCache: Send + Sync {
    fn get(&self, url: &str) -> Option<Bytes>;

    fn put(&self, url: &str, bytes: Bytes);
}
