//! CSRF token cache for mutating session API calls.

use std::time::Duration;

use pulsegate_cache::TtlCache;

/// Only one token is cached per client.
const CSRF_KEY: &str = "csrf";

/// Holds the session service's CSRF token for a fixed lifetime.
///
/// Independent from the gate's verdict cache, with its own TTL.
#[derive(Debug)]
pub struct CsrfTokenCache {
    token: TtlCache<String>,
}

impl CsrfTokenCache {
    /// Create an empty cache whose token expires after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            token: TtlCache::new(ttl, 1),
        }
    }

    /// The cached token, if still fresh.
    pub fn get(&self) -> Option<String> {
        self.token.get(CSRF_KEY)
    }

    /// Store a token.
    pub fn put(&self, token: impl Into<String>) {
        self.token.put(CSRF_KEY, token.into());
    }

    /// Drop the cached token (the server refused it).
    pub fn invalidate(&self) {
        self.token.remove(CSRF_KEY);
    }
}
