//! Presence status definitions.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Presence status of a tracked session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// The user is active and heartbeats are flowing.
    Online,
    /// The session is alive but the user is inactive or the view is hidden.
    Away,
    /// Not tracking. Initial and terminal state.
    #[default]
    Offline,
}

impl PresenceStatus {
    /// Check if the session counts as connected (online or away).
    pub fn is_connected(&self) -> bool {
        !matches!(self, Self::Offline)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresenceStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "away" => Ok(Self::Away),
            "offline" => Ok(Self::Offline),
            _ => Err(AppError::validation(format!(
                "Invalid presence status: '{s}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        assert_eq!("Away".parse::<PresenceStatus>().unwrap(), PresenceStatus::Away);
        assert_eq!(PresenceStatus::Online.to_string(), "online");
        assert!("idle".parse::<PresenceStatus>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&PresenceStatus::Offline).unwrap();
        assert_eq!(json, "\"offline\"");
        assert!(!PresenceStatus::default().is_connected());
    }
}
