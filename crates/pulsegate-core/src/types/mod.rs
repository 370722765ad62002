//! Core type definitions used across the PulseGate workspace.

pub mod presence;
pub mod session;
pub mod token;

pub use presence::PresenceStatus;
pub use session::{SessionId, SessionRecord};
pub use token::Token;
