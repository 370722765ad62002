//! Session record as returned by the external session service.
//!
//! Sessions are owned and persisted by the session service; PulseGate only
//! reads them to confirm that tracking may start.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::presence::PresenceStatus;

/// Identifier assigned to a session by the session service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of a user's active sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub id: SessionId,
    /// Device descriptor (opaque).
    #[serde(default)]
    pub device: Option<String>,
    /// Browser descriptor (opaque).
    #[serde(default)]
    pub browser: Option<String>,
    /// Operating system descriptor (opaque).
    #[serde(default)]
    pub os: Option<String>,
    /// Presence status as last reported to the service.
    #[serde(default)]
    pub status: PresenceStatus,
    /// Last activity recorded by the service.
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Whether this is the caller's own session.
    #[serde(default)]
    pub is_current: bool,
}
