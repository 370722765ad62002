//! Outbound dispatcher: performs queued session API calls in order.
//!
//! Transitions run under the state lock and never await. They queue what
//! the session service must be told, and this task performs each call with
//! a timeout and feeds the outcome back into the tracker.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use pulsegate_core::error::AppError;
use pulsegate_core::result::AppResult;
use pulsegate_core::types::PresenceStatus;

use crate::api::SessionApi;

use super::tracker::TrackerInner;

/// A call queued for the session service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    /// Report a status change.
    Status(PresenceStatus),
    /// Keep-alive.
    Heartbeat,
}

/// Where the dispatcher reports outcomes.
#[derive(Debug)]
pub(crate) struct Dispatcher {
    pub api: Arc<dyn SessionApi>,
    pub timeout: Duration,
    pub tracker: Weak<TrackerInner>,
    pub epoch: u64,
}

impl Dispatcher {
    /// Spawn the dispatcher loop for one tracking run.
    ///
    /// The loop ends when every sender is dropped (after draining the
    /// mailbox) or when `halt` is cancelled (immediately).
    pub fn spawn(self, outbox: mpsc::UnboundedReceiver<Outbound>, halt: CancellationToken) {
        tokio::spawn(self.run(outbox, halt));
    }

    async fn run(self, mut outbox: mpsc::UnboundedReceiver<Outbound>, halt: CancellationToken) {
        loop {
            let message = tokio::select! {
                biased;
                _ = halt.cancelled() => break,
                message = outbox.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };

            let outcome = tokio::select! {
                biased;
                _ = halt.cancelled() => break,
                outcome = self.perform(message) => outcome,
            };

            match self.tracker.upgrade() {
                Some(tracker) => tracker.on_outbound_result(self.epoch, message, outcome),
                None => trace!(?message, "Tracker dropped, discarding call outcome"),
            }
        }
        trace!(epoch = self.epoch, "Outbound dispatcher stopped");
    }

    async fn perform(&self, message: Outbound) -> AppResult<()> {
        let call = async {
            match message {
                Outbound::Status(status) => self.api.update_status(status).await,
                Outbound::Heartbeat => self.api.heartbeat().await,
            }
        };

        tokio::time::timeout(self.timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(AppError::timeout(format!(
                    "Session service did not answer within {:?}",
                    self.timeout
                )))
            })
    }
}
