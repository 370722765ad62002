//! Classification of failed session API calls.

use pulsegate_core::error::{AppError, ErrorKind};

/// How the tracker reacts to a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The caller must sign in again.
    AuthRequired,
    /// The session no longer exists.
    NoSession,
    /// Anything else. Logged and retried on the next opportunity.
    Transient,
}

impl FailureClass {
    /// Classify an error by its kind.
    pub fn of(error: &AppError) -> Self {
        match error.kind {
            ErrorKind::Authentication => Self::AuthRequired,
            ErrorKind::Session => Self::NoSession,
            _ => Self::Transient,
        }
    }

    /// Whether the failure means the session is gone.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Transient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(
            FailureClass::of(&AppError::authentication("expired")),
            FailureClass::AuthRequired
        );
        assert_eq!(
            FailureClass::of(&AppError::session("gone")),
            FailureClass::NoSession
        );
        assert_eq!(
            FailureClass::of(&AppError::timeout("slow")),
            FailureClass::Transient
        );
        assert_eq!(
            FailureClass::of(&AppError::internal("bad body")),
            FailureClass::Transient
        );
        assert!(FailureClass::NoSession.is_terminal());
        assert!(!FailureClass::Transient.is_terminal());
    }
}
