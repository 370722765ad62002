//! Unified application error types for PulseGate.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] doubles as the
//! failure classification used by the presence tracker to decide whether a
//! failed call is transient or must halt tracking.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Authentication failed or is required (invalid, expired, or revoked token).
    Authentication,
    /// Input validation failed (for example a structurally malformed token).
    Validation,
    /// No active session exists for the caller.
    Session,
    /// An internal error occurred.
    Internal,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An external service answered with an unexpected failure.
    ExternalService,
    /// The external service could not be reached.
    ServiceUnavailable,
    /// A call did not complete within its time budget.
    Timeout,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Session => write!(f, "SESSION"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::ExternalService => write!(f, "EXTERNAL_SERVICE"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
            Self::Timeout => write!(f, "TIMEOUT"),
        }
    }
}

/// The unified application error used throughout PulseGate.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a "no active session" error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an external-service error.
    pub fn external_service(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExternalService, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Whether the failure says the caller's session is gone for good
    /// (authentication required or no active session).
    pub fn is_session_terminal(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication | ErrorKind::Session)
    }

    /// Whether the failure is a dependency outage rather than a verdict.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ExternalService | ErrorKind::ServiceUnavailable | ErrorKind::Timeout
        )
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Internal, format!("I/O error: {err}"), err)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        let (kind, message) = if err.is_timeout() {
            (ErrorKind::Timeout, format!("Request timed out: {err}"))
        } else if err.is_connect() {
            (ErrorKind::ServiceUnavailable, format!("Connection failed: {err}"))
        } else if err.is_decode() {
            (ErrorKind::Serialization, format!("Invalid response body: {err}"))
        } else if err.is_status() {
            (ErrorKind::ExternalService, format!("Unexpected status: {err}"))
        } else {
            (ErrorKind::ServiceUnavailable, format!("Request failed: {err}"))
        };
        Self::with_source(kind, message, err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = AppError::session("no active session");
        assert_eq!(err.to_string(), "SESSION: no active session");
    }

    #[test]
    fn test_classification() {
        assert!(AppError::authentication("expired").is_session_terminal());
        assert!(AppError::session("gone").is_session_terminal());
        assert!(!AppError::timeout("slow").is_session_terminal());

        assert!(AppError::timeout("slow").is_transient());
        assert!(AppError::service_unavailable("down").is_transient());
        assert!(!AppError::validation("bad token").is_transient());
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("boom");
        let err = AppError::from(io);
        assert!(std::error::Error::source(&err).is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Internal);
        assert!(cloned.source.is_none());
    }
}
