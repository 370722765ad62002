//! Activity monitor and inactivity timer.

use std::sync::Weak;

use chrono::Utc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace};

use pulsegate_core::types::PresenceStatus;

use crate::signal::{ClientSignal, InputKind, SignalSource};

use super::state::PresenceState;
use super::tracker::TrackerInner;

/// Subscribe to `source` and forward every signal to the tracker.
///
/// The subscription is taken before returning, so signals emitted right
/// after tracking starts are seen. Dropping the guard ends the task, which
/// drops the receiver and detaches from the source.
pub(super) fn spawn_monitor(source: &dyn SignalSource, tracker: Weak<TrackerInner>) -> DropGuard {
    let token = CancellationToken::new();
    let stop = token.clone();
    let mut signals = source.subscribe();

    tokio::spawn(async move {
        loop {
            let signal = tokio::select! {
                biased;
                _ = stop.cancelled() => break,
                received = signals.recv() => match received {
                    Ok(signal) => signal,
                    // Missed signals were interactions all the same.
                    Err(RecvError::Lagged(missed)) => {
                        trace!(missed, "Activity monitor lagged");
                        ClientSignal::Input(InputKind::Pointer)
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            match tracker.upgrade() {
                Some(tracker) => {
                    tracker.handle_signal(signal);
                }
                None => break,
            }
        }
        debug!("Activity monitor detached");
    });

    token.drop_guard()
}

impl TrackerInner {
    /// Arm (or re-arm) the single-shot inactivity timer.
    pub(super) fn arm_inactivity(&self, state: &mut PresenceState) {
        let generation = state.inactivity_generation + 1;
        let tracker = self.weak();

        let timer = self.scheduler.after(
            self.config.inactivity_timeout(),
            Box::new(move || {
                if let Some(tracker) = tracker.upgrade() {
                    tracker.on_inactivity(generation);
                }
            }),
        );
        // The generation only moves once the replacement timer exists.
        state.inactivity_generation = generation;
        state.inactivity = Some(timer);
    }

    fn on_inactivity(&self, generation: u64) {
        let mut state = self.lock();
        if generation != state.inactivity_generation {
            trace!(generation, "Ignoring stale inactivity timer");
            return;
        }
        if state.status == PresenceStatus::Online {
            debug!(
                timeout_secs = self.config.inactivity_timeout_seconds,
                "Inactivity threshold reached"
            );
            self.enter_away(&mut state);
        }
    }

    /// Handle user interaction: refresh the inactivity window while online,
    /// come back online while away.
    pub(super) fn touch(&self, state: &mut PresenceState) {
        match state.status {
            PresenceStatus::Online => {
                state.last_activity = Some(Utc::now());
                self.arm_inactivity(state);
            }
            PresenceStatus::Away => self.enter_online(state),
            PresenceStatus::Offline => {}
        }
    }
}
