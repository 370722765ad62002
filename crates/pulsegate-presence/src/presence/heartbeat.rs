//! Heartbeat scheduling and failure counting.

use tracing::{debug, info, warn};

use pulsegate_core::error::AppError;
use pulsegate_core::types::PresenceStatus;

use super::dispatch::Outbound;
use super::failure::FailureClass;
use super::state::PresenceState;
use super::tracker::TrackerInner;

impl TrackerInner {
    /// Start the periodic heartbeat, replacing any running one.
    pub(super) fn start_heartbeat(&self, state: &mut PresenceState) {
        let tracker = self.weak();
        let handle = self.scheduler.every(
            self.config.heartbeat_interval(),
            Box::new(move || {
                if let Some(tracker) = tracker.upgrade() {
                    tracker.on_heartbeat_tick();
                }
            }),
        );
        state.heartbeat = Some(handle);
        debug!(
            interval_secs = self.config.heartbeat_interval_seconds,
            "Heartbeat started"
        );
    }

    fn on_heartbeat_tick(&self) {
        let state = self.lock();
        if state.tracking && state.status == PresenceStatus::Online {
            debug!("Heartbeat tick");
            state.enqueue(Outbound::Heartbeat);
        }
    }

    /// Count terminal heartbeat failures; a success resets the count.
    /// Transient failures leave it unchanged.
    pub(super) fn on_heartbeat_result(
        &self,
        state: &mut PresenceState,
        result: Result<(), AppError>,
    ) {
        let error = match result {
            Ok(()) => {
                if state.auth_failures > 0 {
                    debug!(previous = state.auth_failures, "Heartbeat recovered");
                }
                state.auth_failures = 0;
                return;
            }
            Err(error) => error,
        };

        match FailureClass::of(&error) {
            FailureClass::Transient => {
                warn!(error = %error, "Heartbeat failed, retrying on next tick");
            }
            class => {
                state.auth_failures += 1;
                warn!(
                    error = %error,
                    ?class,
                    failures = state.auth_failures,
                    max = self.config.max_auth_failures,
                    "Heartbeat rejected"
                );
                if state.auth_failures >= self.config.max_auth_failures {
                    info!(
                        failures = state.auth_failures,
                        "Stopping heartbeat after repeated authentication failures"
                    );
                    self.force_offline(state);
                }
            }
        }
    }
}
