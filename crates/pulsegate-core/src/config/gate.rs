//! Token gate configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Configuration for the server-side token validation gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Base URL of the upstream authentication service.
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
    /// Path of the profile endpoint used to validate a bearer token.
    #[serde(default = "default_profile_path")]
    pub profile_path: String,
    /// Seconds a validation verdict stays fresh in the cache.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    /// Maximum number of cached verdicts before the oldest half is evicted.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
    /// Upper bound on a single upstream validation call, in milliseconds.
    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_ms: u64,
    /// Allow requests through when the upstream cannot be reached.
    #[serde(default = "default_true")]
    pub fail_open: bool,
}

impl GateConfig {
    /// Reject a zero cache bound or upstream timeout.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.cache_max_entries == 0 {
            return Err(AppError::configuration(
                "gate.cache_max_entries must be greater than zero",
            ));
        }
        if self.upstream_timeout_ms == 0 {
            return Err(AppError::configuration(
                "gate.upstream_timeout_ms must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Upstream timeout as a [`Duration`].
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    /// Full URL of the profile validation endpoint.
    pub fn profile_url(&self) -> String {
        format!(
            "{}/{}",
            self.upstream_url.trim_end_matches('/'),
            self.profile_path.trim_start_matches('/')
        )
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            upstream_url: default_upstream_url(),
            profile_path: default_profile_path(),
            cache_ttl_seconds: default_cache_ttl(),
            cache_max_entries: default_cache_max_entries(),
            upstream_timeout_ms: default_upstream_timeout(),
            fail_open: true,
        }
    }
}

fn default_upstream_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_profile_path() -> String {
    "/api/auth/profile".to_string()
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_cache_max_entries() -> usize {
    100
}

fn default_upstream_timeout() -> u64 {
    3000
}

fn default_true() -> bool {
    true
}
