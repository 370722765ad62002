//! Bearer token newtype with the structural format check.

use std::fmt;

use crate::error::AppError;

/// Number of dot-separated segments in a well-formed token.
pub const TOKEN_SEGMENTS: usize = 3;

/// Prefix of an `Authorization` header carrying a bearer token.
const BEARER_PREFIX: &str = "Bearer ";

/// An opaque bearer credential that passed the structural check.
///
/// The check only guarantees shape (three non-empty dot-separated
/// segments); it says nothing about whether the token is accepted
/// upstream.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Validates the raw string and wraps it.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AppError::validation("Malformed bearer token"))
        }
    }

    /// Returns `true` if `raw` has exactly three non-empty dot-separated segments.
    pub fn is_well_formed(raw: &str) -> bool {
        if raw.is_empty() {
            return false;
        }
        let mut segments = 0;
        for segment in raw.split('.') {
            if segment.is_empty() {
                return false;
            }
            segments += 1;
        }
        segments == TOKEN_SEGMENTS
    }

    /// Extracts and validates the token from an `Authorization` header value.
    pub fn from_authorization_header(value: &str) -> Result<Self, AppError> {
        let raw = value
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| AppError::authentication("Missing bearer token"))?;
        Self::parse(raw.trim())
    }

    /// The raw token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Never print the credential itself.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(len={})", self.0.len())
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_well_formed() {
        assert!(Token::is_well_formed("aaa.bbb.ccc"));
        assert!(Token::parse("eyJhbGciOi.eyJzdWIiOi.c2lnbmF0dXJl").is_ok());
    }

    #[test]
    fn test_malformed() {
        for raw in ["", "abc", "a.b", "a.b.c.d", ".b.c", "a..c", "a.b.", "..."] {
            assert!(!Token::is_well_formed(raw), "{raw:?} should be rejected");
            let err = Token::parse(raw).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
        }
    }

    #[test]
    fn test_authorization_header() {
        let token = Token::from_authorization_header("Bearer a.b.c").unwrap();
        assert_eq!(token.as_str(), "a.b.c");

        let err = Token::from_authorization_header("Basic dXNlcjpwYXNz").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        assert!(Token::from_authorization_header("Bearer nope").is_err());
    }

    #[test]
    fn test_debug_hides_value() {
        let token = Token::parse("secret.secret.secret").unwrap();
        assert!(!format!("{token:?}").contains("secret"));
    }
}
