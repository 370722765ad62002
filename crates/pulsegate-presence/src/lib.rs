//! # pulsegate-presence
//!
//! Client-side presence tracking for PulseGate. Provides:
//!
//! - A presence state machine (`online` / `away` / `offline`) that reports
//!   each transition to the session service
//! - Periodic heartbeats while online, stopping after repeated
//!   authentication failures
//! - Inactivity and visibility monitoring over an injected signal source
//! - A fire-and-forget offline beacon for teardown
//!
//! Timers go through the [`Scheduler`] capability and input arrives through
//! a [`SignalSource`], so the tracker runs the same under a UI toolkit, an
//! OS signal bridge, or a test harness on a paused tokio clock.

pub mod api;
pub mod presence;
pub mod scheduler;
pub mod signal;
pub mod unload;

pub use api::{CsrfTokenCache, HttpSessionApi, SessionApi};
pub use presence::{FailureClass, Outbound, PresenceTracker, TrackerBuilder};
pub use scheduler::{Scheduler, TimerHandle, TokioScheduler};
pub use signal::{ClientSignal, InputKind, SignalHub, SignalSource, Visibility};
pub use unload::UnloadNotifier;
