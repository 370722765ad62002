//! Session service seam used by the presence tracker.

pub mod csrf;
pub mod http;

pub use csrf::CsrfTokenCache;
pub use http::HttpSessionApi;

use async_trait::async_trait;

use pulsegate_core::result::AppResult;
use pulsegate_core::types::{PresenceStatus, SessionRecord};

/// Calls the external session service makes available to the tracker.
///
/// Failures are classified by [`ErrorKind`](pulsegate_core::ErrorKind):
/// `Authentication` means the caller must sign in again, `Session` means
/// there is no active session, and the transient kinds mean "try again
/// later".
#[async_trait]
pub trait SessionApi: Send + Sync + std::fmt::Debug + 'static {
    /// Look up the caller's current session.
    async fn current_session(&self) -> AppResult<SessionRecord>;

    /// Keep-alive for the current session.
    async fn heartbeat(&self) -> AppResult<()>;

    /// Report a presence status change.
    async fn update_status(&self, status: PresenceStatus) -> AppResult<()>;

    /// Fire-and-forget "going offline" notification for teardown.
    ///
    /// Must return immediately: never awaited, never retried, and any
    /// failure is discarded.
    fn send_offline_beacon(&self);
}
