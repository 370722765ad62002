//! Best-effort offline notification at teardown.

use tracing::debug;

use pulsegate_core::types::PresenceStatus;

use crate::presence::PresenceTracker;

/// Sends a single offline beacon when the application is torn down.
///
/// Call [`notify`](Self::notify) from the host's teardown hook. The beacon
/// is never awaited or retried and its failure is discarded.
#[derive(Debug, Clone)]
pub struct UnloadNotifier {
    tracker: PresenceTracker,
}

impl UnloadNotifier {
    pub fn new(tracker: &PresenceTracker) -> Self {
        Self {
            tracker: tracker.clone(),
        }
    }

    /// Send the beacon if the tracker is `online`. Returns whether one was
    /// sent.
    pub fn notify(&self) -> bool {
        let status = self.tracker.status();
        if status != PresenceStatus::Online {
            debug!(%status, "Not online, no offline beacon");
            return false;
        }

        self.tracker.api().send_offline_beacon();
        debug!("Offline beacon sent");
        true
    }
}
