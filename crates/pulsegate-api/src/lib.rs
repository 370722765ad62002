//! # pulsegate-api
//!
//! HTTP API layer for PulseGate built on Axum.
//!
//! Provides the health endpoint, the token gate middleware guarding
//! protected routes, response DTOs, and error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
