//! LRU memo cache for derived fields and rendered images.
//!
//! Entries are keyed by the identity of their source file, so a file that is
//! replaced on disk gets a fresh key and the stale entry simply ages out.

use std::fs;
use std::hash::Hash;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use lru::LruCache;
use serde::Serialize;

/// Default number of entries when none is configured.
pub const DEFAULT_CACHE_ENTRIES: usize = 32;

/// Identity of an input file plus request discriminators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
    /// Extra discriminator such as a time index or a variant tag
    pub variant: String,
}

impl SourceKey {
    /// Build a key from the file's metadata.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let path = fs::canonicalize(path)?;
        let meta = fs::metadata(&path)?;
        Ok(Self {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
            variant: String::new(),
        })
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Entry-bounded LRU cache of immutable shared values.
pub struct MemoCache<K: Hash + Eq, V> {
    cache: LruCache<K, Arc<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl<K: Hash + Eq, V> MemoCache<K, V> {
    /// Create a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up an entry, counting a hit or a miss.
    pub fn get(&mut self, key: &K) -> Option<Arc<V>> {
        if let Some(value) = self.cache.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            Some(Arc::clone(value))
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }

    /// Check if a key exists without updating LRU order.
    pub fn contains(&self, key: &K) -> bool {
        self.cache.contains(key)
    }

    /// Insert a value, evicting the least recently used entry when full.
    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if let Some((evicted_key, _)) = self.cache.push(key, Arc::clone(&value)) {
            // push returns the replaced entry too; only count real evictions
            if !self.cache.contains(&evicted_key) {
                self.evictions.fetch_add(1, Ordering::Relaxed);
            }
        }
        value
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}
