//! Presence state machine and the tasks that drive it.

mod activity;
mod dispatch;
mod failure;
mod heartbeat;
mod state;
pub mod tracker;

pub use dispatch::Outbound;
pub use failure::FailureClass;
pub use tracker::{PresenceTracker, TrackerBuilder};
