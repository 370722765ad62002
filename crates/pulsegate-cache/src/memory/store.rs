//! Size-bounded TTL map with lazy expiry and oldest-half eviction.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// A cached value with its insertion time.
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    /// Insertion order, breaks ties between equal timestamps.
    seq: u64,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    next_seq: u64,
}

/// In-memory cache keyed by string with a fixed TTL and entry bound.
///
/// Reads can mutate (a stale entry is removed when it is read), so every
/// operation takes the same lock and insert/evict are atomic with respect
/// to each other.
#[derive(Debug)]
pub struct TtlCache<V> {
    inner: Mutex<Inner<V>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache whose entries expire after `ttl`, holding at most
    /// `max_entries` (minimum 1).
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                next_seq: 0,
            }),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// The configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The configured entry bound.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Get a fresh value. A stale entry is removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        let stale = match inner.entries.get(key) {
            Some(entry) if !self.is_stale(entry, now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if stale {
            inner.entries.remove(key);
            debug!("Dropped stale cache entry on read");
        }
        None
    }

    /// Insert or overwrite a value, stamping it with the current time.
    ///
    /// When inserting a new key into a full cache, stale entries are removed
    /// first, then the oldest half by timestamp if it is still full.
    pub fn put(&self, key: &str, value: V) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            let ttl = self.ttl;
            inner
                .entries
                .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);

            if inner.entries.len() >= self.max_entries {
                Self::evict_oldest_half(&mut inner.entries);
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
                seq,
            },
        );
    }

    /// Remove a single key.
    pub fn remove(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.remove(key).map(|entry| entry.value)
    }

    /// Remove every stale entry. Returns how many were removed.
    pub fn evict_stale(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let before = inner.entries.len();
        let ttl = self.ttl;
        inner
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.inserted_at) <= ttl);
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "Evicted stale cache entries");
        }
        removed
    }

    /// Number of entries currently stored, stale or not.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entries
            .clear();
    }

    fn is_stale(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.inserted_at) > self.ttl
    }

    fn evict_oldest_half(entries: &mut HashMap<String, CacheEntry<V>>) {
        let mut by_age: Vec<(Instant, u64, String)> = entries
            .iter()
            .map(|(key, entry)| (entry.inserted_at, entry.seq, key.clone()))
            .collect();
        by_age.sort_unstable();

        let count = by_age.len().div_ceil(2);
        for (_, _, key) in by_age.into_iter().take(count) {
            entries.remove(&key);
        }
        debug!(evicted = count, "Cache full, evicted oldest half");
    }
}
