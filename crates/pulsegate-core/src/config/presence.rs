//! Presence tracking configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Configuration for the client-side presence tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Base URL of the session API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Interval between keep-alive heartbeats while online, in seconds.
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,
    /// Inactivity before an online session is marked away, in seconds.
    #[serde(default = "default_inactivity_timeout")]
    pub inactivity_timeout_seconds: u64,
    /// Upper bound on each session API call, in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Consecutive heartbeat auth failures that stop tracking.
    #[serde(default = "default_max_auth_failures")]
    pub max_auth_failures: u32,
    /// Lifetime of a fetched CSRF token, in seconds.
    #[serde(default = "default_csrf_ttl")]
    pub csrf_ttl_seconds: u64,
    /// Session API endpoint paths, relative to `api_base_url`.
    #[serde(default)]
    pub endpoints: SessionEndpoints,
}

/// Paths of the session API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndpoints {
    #[serde(default = "default_current_path")]
    pub current: String,
    #[serde(default = "default_heartbeat_path")]
    pub heartbeat: String,
    #[serde(default = "default_status_path")]
    pub status: String,
    #[serde(default = "default_offline_path")]
    pub offline: String,
    #[serde(default = "default_csrf_path")]
    pub csrf: String,
}

impl Default for SessionEndpoints {
    fn default() -> Self {
        Self {
            current: default_current_path(),
            heartbeat: default_heartbeat_path(),
            status: default_status_path(),
            offline: default_offline_path(),
            csrf: default_csrf_path(),
        }
    }
}

impl PresenceConfig {
    /// Reject zero periods and thresholds.
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, value) in [
            ("heartbeat_interval_seconds", self.heartbeat_interval_seconds),
            ("inactivity_timeout_seconds", self.inactivity_timeout_seconds),
            ("request_timeout_ms", self.request_timeout_ms),
            ("max_auth_failures", u64::from(self.max_auth_failures)),
        ] {
            if value == 0 {
                return Err(AppError::configuration(format!(
                    "presence.{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Heartbeat period as a [`Duration`].
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }

    /// Inactivity threshold as a [`Duration`].
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_seconds)
    }

    /// Per-call timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// CSRF token lifetime as a [`Duration`].
    pub fn csrf_ttl(&self) -> Duration {
        Duration::from_secs(self.csrf_ttl_seconds)
    }

    /// Join `path` onto the session API base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            inactivity_timeout_seconds: default_inactivity_timeout(),
            request_timeout_ms: default_request_timeout(),
            max_auth_failures: default_max_auth_failures(),
            csrf_ttl_seconds: default_csrf_ttl(),
            endpoints: SessionEndpoints::default(),
        }
    }
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_inactivity_timeout() -> u64 {
    300
}

fn default_request_timeout() -> u64 {
    3000
}

fn default_max_auth_failures() -> u32 {
    3
}

fn default_csrf_ttl() -> u64 {
    1800
}

fn default_current_path() -> String {
    "/api/sessions/current".to_string()
}

fn default_heartbeat_path() -> String {
    "/api/sessions/heartbeat".to_string()
}

fn default_status_path() -> String {
    "/api/sessions/status".to_string()
}

fn default_offline_path() -> String {
    "/api/sessions/offline".to_string()
}

fn default_csrf_path() -> String {
    "/api/csrf-token".to_string()
}
