//! # pulsegate-auth
//!
//! Server-side token validation for PulseGate.
//!
//! ## Modules
//!
//! - `upstream`: the [`AuthUpstream`] seam and its HTTP implementation
//!   against the authentication service's profile endpoint
//! - `gate`: [`TokenGate`]: structural check, verdict cache, upstream
//!   fallback, and the fail-open policy on upstream unavailability

pub mod gate;
pub mod upstream;

pub use gate::{GateDecision, TokenGate};
pub use upstream::{AuthUpstream, HttpAuthUpstream, UpstreamVerdict};
