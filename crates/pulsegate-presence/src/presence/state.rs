//! Mutable tracker state, owned by a single mutex.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use pulsegate_core::types::{PresenceStatus, SessionRecord};

use crate::scheduler::TimerHandle;

use super::dispatch::Outbound;

/// Everything a transition reads or writes.
///
/// Timer and task handles are owned here: replacing or clearing a field
/// cancels what it held.
#[derive(Debug, Default)]
pub struct PresenceState {
    pub status: PresenceStatus,
    pub tracking: bool,
    pub session: Option<SessionRecord>,
    pub last_activity: Option<DateTime<Utc>>,
    pub heartbeat: Option<TimerHandle>,
    pub inactivity: Option<TimerHandle>,
    /// Bumped every time the inactivity timer is re-armed. A firing that
    /// carries an older value is stale.
    pub inactivity_generation: u64,
    pub auth_failures: u32,
    pub outbox: Option<mpsc::UnboundedSender<Outbound>>,
    /// Stops the dispatcher without draining its mailbox.
    pub halt: Option<CancellationToken>,
    pub monitor: Option<DropGuard>,
    /// Identifies one tracking run. Results from an older run are ignored.
    pub epoch: u64,
}

impl PresenceState {
    /// Queue an outbound call. Dropped silently when no run is active.
    pub fn enqueue(&self, message: Outbound) {
        if let Some(outbox) = &self.outbox {
            let _ = outbox.send(message);
        }
    }

    /// Cancel both timers.
    pub fn clear_timers(&mut self) {
        self.heartbeat = None;
        self.inactivity = None;
    }

    pub fn heartbeat_active(&self) -> bool {
        self.heartbeat.as_ref().is_some_and(TimerHandle::is_active)
    }

    pub fn inactivity_active(&self) -> bool {
        self.inactivity.as_ref().is_some_and(TimerHandle::is_active)
    }

    /// Tear down the current run and return to `offline`.
    ///
    /// With `drain` the dispatcher finishes calls already queued, otherwise
    /// it stops immediately.
    pub fn reset(&mut self, drain: bool) {
        self.clear_timers();
        self.monitor = None;
        self.outbox = None;
        if let Some(halt) = self.halt.take() {
            if !drain {
                halt.cancel();
            }
        }
        self.status = PresenceStatus::Offline;
        self.tracking = false;
        self.session = None;
        self.epoch += 1;
    }
}
