//! Bounded memo cache in front of the parser.
//! Keyed by the blake3 hash of the raw message, LRU eviction.

use super::{parser::parse_uncached, Segment};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use tracing::{debug, trace};

pub const DEFAULT_CAPACITY: usize = 256;

static GLOBAL: OnceLock<SegmentCache> = OnceLock::new();

/// Process-wide cache used by [`super::parse`].
pub fn global() -> &'static SegmentCache {
    GLOBAL.get_or_init(|| SegmentCache::new(default_capacity()))
}

/// Installs the process-wide cache with the given capacity.
/// Returns `false` if it was already initialized (by this call or by a parse).
pub fn install_global(capacity: NonZeroUsize) -> bool {
    let installed = GLOBAL.set(SegmentCache::new(capacity)).is_ok();
    if !installed {
        debug!(capacity = capacity.get(), "Segment cache already initialized");
    }
    installed
}

fn default_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

pub struct SegmentCache {
    entries: Mutex<LruCache<blake3::Hash, Arc<[Segment]>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl SegmentCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached segments for `raw`, parsing on a miss.
    /// Parsing happens outside the lock.
    pub fn get_or_parse(&self, raw: &str) -> Arc<[Segment]> {
        let key = blake3::hash(raw.as_bytes());

        if let Some(hit) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(key = %key.to_hex(), "Segment cache hit");
            return Arc::clone(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let segments: Arc<[Segment]> = parse_uncached(raw).into();
        self.lock().put(key, Arc::clone(&segments));
        trace!(key = %key.to_hex(), count = segments.len(), "Segment cache miss");
        segments
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.lock();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len: entries.len(),
            capacity: entries.cap().get(),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are immutable parse results; a poisoned lock still holds valid ones.
    fn lock(&self) -> MutexGuard<'_, LruCache<blake3::Hash, Arc<[Segment]>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SegmentCache {
    fn default() -> Self {
        Self::new(default_capacity())
    }
}
