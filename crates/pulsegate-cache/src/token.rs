//! Token → validation verdict cache used by the token gate.

use std::time::Duration;

use crate::memory::TtlCache;

/// Caches whether a bearer token was accepted, for a short TTL.
///
/// `get` answers `Some(verdict)` while the entry is fresh and `None`
/// ("unknown") once it is absent or stale.
#[derive(Debug)]
pub struct TokenValidationCache {
    verdicts: TtlCache<bool>,
}

impl TokenValidationCache {
    /// Create a cache with the given TTL and entry bound.
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            verdicts: TtlCache::new(ttl, max_entries),
        }
    }

    /// The cached verdict for `token`, if fresh.
    pub fn get(&self, token: &str) -> Option<bool> {
        self.verdicts.get(token)
    }

    /// Record a verdict for `token`.
    pub fn put(&self, token: &str, valid: bool) {
        self.verdicts.put(token, valid);
    }

    /// Drop every stale verdict. Returns how many were removed.
    pub fn evict_stale(&self) -> usize {
        self.verdicts.evict_stale()
    }

    /// Forget a single token (for example after logout).
    pub fn invalidate(&self, token: &str) {
        self.verdicts.remove(token);
    }

    /// Number of stored verdicts.
    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    /// Whether no verdicts are stored.
    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// Drop every verdict.
    pub fn clear(&self) {
        self.verdicts.clear();
    }

    /// How long a verdict stays fresh.
    pub fn ttl(&self) -> Duration {
        self.verdicts.ttl()
    }

    /// Maximum number of stored verdicts.
    pub fn max_entries(&self) -> usize {
        self.verdicts.max_entries()
    }
}
