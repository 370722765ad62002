//! # pulsegate-core
//!
//! Core crate for PulseGate. Contains configuration schemas, the token and
//! presence domain types, and the unified error system shared by the
//! token gate and the presence tracker.
//!
//! This crate has **no** internal dependencies on other PulseGate crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
