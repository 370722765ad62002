//! Presence tracker: `offline` / `online` / `away` state machine.
//!
//! Every transition is a short synchronous critical section over the
//! tracker state. Calls to the session service are queued on the outbound
//! dispatcher and their outcomes are fed back as results. Timer and monitor
//! callbacks hold a weak reference, so dropping the last [`PresenceTracker`]
//! stops them.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use pulsegate_core::config::PresenceConfig;
use pulsegate_core::error::AppError;
use pulsegate_core::result::AppResult;
use pulsegate_core::types::{PresenceStatus, SessionRecord};

use crate::api::SessionApi;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::signal::{ClientSignal, InputKind, SignalSource, Visibility};

use super::activity::spawn_monitor;
use super::dispatch::{Dispatcher, Outbound};
use super::failure::FailureClass;
use super::state::PresenceState;

/// Builds a [`PresenceTracker`].
#[derive(Debug)]
pub struct TrackerBuilder {
    api: Arc<dyn SessionApi>,
    config: PresenceConfig,
    scheduler: Option<Arc<dyn Scheduler>>,
    signals: Option<Arc<dyn SignalSource>>,
}

impl TrackerBuilder {
    /// Start a builder around the session API.
    pub fn new(api: Arc<dyn SessionApi>) -> Self {
        Self {
            api,
            config: PresenceConfig::default(),
            scheduler: None,
            signals: None,
        }
    }

    /// Use these tunables instead of the defaults.
    pub fn config(mut self, config: PresenceConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom timer implementation. Defaults to a [`TokioScheduler`]
    /// on the runtime current at [`build`](Self::build).
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Monitor this signal source for activity and visibility changes.
    pub fn signals(mut self, signals: Arc<dyn SignalSource>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn build(self) -> PresenceTracker {
        let scheduler: Arc<dyn Scheduler> = match self.scheduler {
            Some(scheduler) => scheduler,
            None => Arc::new(TokioScheduler::new()),
        };

        let inner = Arc::new_cyclic(|me| TrackerInner {
            api: self.api,
            config: self.config,
            scheduler,
            signals: self.signals,
            state: Mutex::new(PresenceState::default()),
            me: me.clone(),
        });

        PresenceTracker { inner }
    }
}

/// Shared tracker internals.
#[derive(Debug)]
pub(crate) struct TrackerInner {
    pub(super) api: Arc<dyn SessionApi>,
    pub(super) config: PresenceConfig,
    pub(super) scheduler: Arc<dyn Scheduler>,
    signals: Option<Arc<dyn SignalSource>>,
    state: Mutex<PresenceState>,
    me: Weak<TrackerInner>,
}

impl TrackerInner {
    pub(super) fn weak(&self) -> Weak<TrackerInner> {
        self.me.clone()
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, PresenceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// `offline -> online` after a confirmed session lookup.
    fn begin(&self, state: &mut PresenceState, session: SessionRecord) {
        state.epoch += 1;
        let (outbox, mailbox) = mpsc::unbounded_channel();
        let halt = CancellationToken::new();
        Dispatcher {
            api: self.api.clone(),
            timeout: self.config.request_timeout(),
            tracker: self.weak(),
            epoch: state.epoch,
        }
        .spawn(mailbox, halt.clone());

        info!(session_id = %session.id, "Presence tracking started");
        state.outbox = Some(outbox);
        state.halt = Some(halt);
        state.session = Some(session);
        state.tracking = true;
        state.status = PresenceStatus::Online;
        state.auth_failures = 0;
        state.last_activity = Some(Utc::now());

        state.enqueue(Outbound::Status(PresenceStatus::Online));
        self.start_heartbeat(state);
        self.arm_inactivity(state);
        state.monitor = self
            .signals
            .as_deref()
            .map(|source| spawn_monitor(source, self.weak()));
    }

    /// `online -> away`. The heartbeat pauses until the user returns.
    pub(super) fn enter_away(&self, state: &mut PresenceState) {
        state.status = PresenceStatus::Away;
        state.clear_timers();
        state.enqueue(Outbound::Status(PresenceStatus::Away));
        info!(status = %state.status, "Presence changed");
    }

    /// `away -> online`, with an immediate heartbeat.
    pub(super) fn enter_online(&self, state: &mut PresenceState) {
        state.status = PresenceStatus::Online;
        state.last_activity = Some(Utc::now());
        state.enqueue(Outbound::Status(PresenceStatus::Online));
        state.enqueue(Outbound::Heartbeat);
        self.start_heartbeat(state);
        self.arm_inactivity(state);
        info!(status = %state.status, "Presence changed");
    }

    /// The session is gone: go `offline` without telling the service and
    /// drop any call still queued.
    pub(super) fn force_offline(&self, state: &mut PresenceState) {
        if !state.tracking {
            return;
        }
        state.reset(false);
        warn!("Session is no longer active, presence forced offline");
    }

    /// Apply a client signal and return the resulting status.
    pub(crate) fn handle_signal(&self, signal: ClientSignal) -> PresenceStatus {
        let mut state = self.lock();
        match signal {
            ClientSignal::Input(_) => self.touch(&mut state),
            ClientSignal::Visibility(Visibility::Hidden) => {
                if state.status == PresenceStatus::Online {
                    self.enter_away(&mut state);
                }
            }
            ClientSignal::Visibility(Visibility::Visible) => {
                if state.status == PresenceStatus::Away {
                    self.enter_online(&mut state);
                }
            }
        }
        state.status
    }

    /// Outcome of a dispatched call.
    pub(crate) fn on_outbound_result(&self, epoch: u64, message: Outbound, result: AppResult<()>) {
        let mut state = self.lock();
        if epoch != state.epoch {
            if let Err(e) = &result {
                debug!(?message, error = %e, "Call from a finished tracking run failed");
            }
            return;
        }

        match message {
            Outbound::Heartbeat => self.on_heartbeat_result(&mut state, result),
            Outbound::Status(status) => match result {
                Ok(()) => debug!(%status, "Status update delivered"),
                Err(e) => self.on_status_failure(&mut state, status, &e),
            },
        }
    }

    fn on_status_failure(&self, state: &mut PresenceState, status: PresenceStatus, error: &AppError) {
        match FailureClass::of(error) {
            FailureClass::Transient => {
                warn!(%status, error = %error, "Status update failed, keeping local state");
            }
            class => {
                warn!(%status, ?class, error = %error, "Status update rejected");
                self.force_offline(state);
            }
        }
    }
}

/// Client presence tracker.
///
/// Cloning yields another handle to the same tracker.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    inner: Arc<TrackerInner>,
}

impl PresenceTracker {
    /// Tracker with default scheduler and no signal source.
    pub fn new(api: Arc<dyn SessionApi>, config: PresenceConfig) -> Self {
        TrackerBuilder::new(api).config(config).build()
    }

    pub fn builder(api: Arc<dyn SessionApi>) -> TrackerBuilder {
        TrackerBuilder::new(api)
    }

    /// Look up the current session and go `online` if there is one.
    ///
    /// Returns `Ok(false)` when there is no active session or the caller
    /// must sign in again; the tracker stays `offline` with no timers. A
    /// transient lookup failure is returned as the error. Already tracking
    /// is `Ok(true)`.
    pub async fn start_tracking(&self) -> AppResult<bool> {
        if self.is_tracking() {
            return Ok(true);
        }

        let timeout = self.inner.config.request_timeout();
        let lookup = tokio::time::timeout(timeout, self.inner.api.current_session())
            .await
            .unwrap_or_else(|_| {
                Err(AppError::timeout(format!(
                    "Session lookup did not answer within {timeout:?}"
                )))
            });

        let session = match lookup {
            Ok(session) => session,
            Err(e) => {
                let class = FailureClass::of(&e);
                if class.is_terminal() {
                    info!(?class, "No active session, presence tracking not started");
                    return Ok(false);
                }
                warn!(error = %e, "Session lookup failed");
                return Err(e);
            }
        };

        let mut state = self.inner.lock();
        if !state.tracking {
            self.inner.begin(&mut state, session);
        }
        Ok(true)
    }

    /// Stop tracking: report `offline`, cancel timers, detach the activity
    /// monitor. Safe to call repeatedly.
    pub fn stop_tracking(&self) {
        self.go_offline();
    }

    /// `away -> online`. No-op in any other state.
    pub fn go_online(&self) -> PresenceStatus {
        let mut state = self.inner.lock();
        if state.status == PresenceStatus::Away {
            self.inner.enter_online(&mut state);
        }
        state.status
    }

    /// `online -> away`. No-op in any other state.
    pub fn go_away(&self) -> PresenceStatus {
        let mut state = self.inner.lock();
        if state.status == PresenceStatus::Online {
            self.inner.enter_away(&mut state);
        }
        state.status
    }

    /// `online|away -> offline`, sending a final status update.
    pub fn go_offline(&self) -> PresenceStatus {
        let mut state = self.inner.lock();
        if !state.tracking {
            return state.status;
        }

        // Queued before the mailbox closes; the dispatcher drains it.
        state.enqueue(Outbound::Status(PresenceStatus::Offline));
        state.reset(true);
        info!("Presence tracking stopped");
        state.status
    }

    /// Register user interaction.
    pub fn record_activity(&self) -> PresenceStatus {
        self.handle_signal(ClientSignal::Input(InputKind::Pointer))
    }

    /// The tracked view was shown or hidden.
    pub fn visibility_changed(&self, visibility: Visibility) -> PresenceStatus {
        self.handle_signal(ClientSignal::Visibility(visibility))
    }

    /// Apply a client signal directly, without a signal source.
    pub fn handle_signal(&self, signal: ClientSignal) -> PresenceStatus {
        self.inner.handle_signal(signal)
    }

    pub fn status(&self) -> PresenceStatus {
        self.inner.lock().status
    }

    pub fn is_tracking(&self) -> bool {
        self.inner.lock().tracking
    }

    /// When the user last interacted while tracked.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.inner.lock().last_activity
    }

    /// The session confirmed by the last successful start.
    pub fn session(&self) -> Option<SessionRecord> {
        self.inner.lock().session.clone()
    }

    pub fn heartbeat_active(&self) -> bool {
        self.inner.lock().heartbeat_active()
    }

    pub fn inactivity_timer_active(&self) -> bool {
        self.inner.lock().inactivity_active()
    }

    /// Terminal heartbeat failures since the last success.
    pub fn consecutive_auth_failures(&self) -> u32 {
        self.inner.lock().auth_failures
    }

    /// The session API this tracker reports to.
    pub fn api(&self) -> &Arc<dyn SessionApi> {
        &self.inner.api
    }
}
