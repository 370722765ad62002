//! Convenience result type alias for PulseGate.

use crate::error::AppError;

/// A specialized `Result` type for PulseGate operations.
///
/// This is defined as a convenience so that every crate does not need to
/// write `Result<T, AppError>` explicitly.
pub type AppResult<T> = Result<T, AppError>;
