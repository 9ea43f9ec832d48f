use std::collections::{HashMap, VecDeque};

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use super::ResourceCache;
use crate::config::CacheConfig;

const COMPACT_SLACK: usize = 16;

#[derive(Debug)]
struct Entry {
    bytes: Bytes,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    /// Insertion order, oldest first. A position is live only while its
    /// `seq` matches the entry's; replaced keys leave stale positions behind.
    order: VecDeque<(u64, String)>,
    next_seq: u64,
    total_bytes: usize,
}

impl Inner {
    fn remove(&mut self, url: &str) {
        if let Some(old) = self.entries.remove(url) {
            self.total_bytes -= old.bytes.len();
        }
    }

    fn insert(&mut self, url: &str, bytes: Bytes) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.total_bytes += bytes.len();
        self.order.push_back((seq, url.to_string()));
        self.entries.insert(url.to_string(), Entry { bytes, seq });

        if self.order.len() > 2 * self.entries.len() + COMPACT_SLACK {
            self.compact();
        }
    }

    fn is_live(&self, seq: u64, url: &str) -> bool {
        self.entries.get(url).is_some_and(|entry| entry.seq == seq)
    }

    fn compact(&mut self) {
        let order = std::mem::take(&mut self.order);
        let live: VecDeque<_> = order
            .into_iter()
            .filter(|(seq, url)| self.is_live(*seq, url))
            .collect();
        self.order = live;
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((seq, key)) = self.order.pop_front() {
            if !self.is_live(seq, &key) {
                continue;
            }
            if let Some(old) = self.entries.remove(&key) {
                self.total_bytes -= old.bytes.len();
                debug!(url = %key, size = old.bytes.len(), "Evicted cache entry");
            }
            return true;
        }
        false
    }
}

/// Bounded in-memory cache that evicts the oldest entries first.
///
/// Bounds are internal housekeeping, not a retention promise.
#[derive(Debug)]
pub struct MemoryCache {
    inner: Mutex<Inner>,
    max_entries: usize,
    max_bytes: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries,
            max_bytes,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_entries, config.max_bytes.as_usize())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl ResourceCache for MemoryCache {
    fn get(&self, url: &str) -> Option<Bytes> {
        self.inner.lock().entries.get(url).map(|entry| entry.bytes.clone())
    }

    fn put(&self, url: &str, bytes: Bytes) {
        let mut inner = self.inner.lock();
        inner.remove(url);

        if bytes.len() > self.max_bytes || self.max_entries == 0 {
            debug!(url, size = bytes.len(), "Entry exceeds cache bounds, not retained");
            return;
        }

        while inner.entries.len() >= self.max_entries
            || inner.total_bytes + bytes.len() > self.max_bytes
        {
            if !inner.evict_oldest() {
                break;
            }
        }

        inner.insert(url, bytes);
    }
}
