//! Shared test doubles for presence integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use pulsegate_core::error::{AppError, ErrorKind};
use pulsegate_core::result::AppResult;
use pulsegate_core::types::{PresenceStatus, SessionId, SessionRecord};
use pulsegate_presence::scheduler::{OnceTask, RepeatTask};
use pulsegate_presence::{
    PresenceTracker, Scheduler, SessionApi, SignalHub, TimerHandle, TokioScheduler,
};

/// A call observed by the mock session API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    CurrentSession,
    Heartbeat,
    Status(PresenceStatus),
    Beacon,
}

/// How the mock answers a call.
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    Ok,
    Fail(ErrorKind),
    Hang,
}

/// Session API double recording every call.
#[derive(Debug)]
pub struct MockSessionApi {
    lookup: Mutex<Reply>,
    status: Mutex<Reply>,
    heartbeat: Mutex<Reply>,
    /// Consumed first, one reply per heartbeat, before `heartbeat`.
    heartbeat_script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl MockSessionApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            lookup: Mutex::new(Reply::Ok),
            status: Mutex::new(Reply::Ok),
            heartbeat: Mutex::new(Reply::Ok),
            heartbeat_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn set_lookup(&self, reply: Reply) {
        *self.lookup.lock().unwrap() = reply;
    }

    pub fn set_status(&self, reply: Reply) {
        *self.status.lock().unwrap() = reply;
    }

    pub fn set_heartbeat(&self, reply: Reply) {
        *self.heartbeat.lock().unwrap() = reply;
    }

    pub fn script_heartbeats(&self, replies: impl IntoIterator<Item = Reply>) {
        self.heartbeat_script.lock().unwrap().extend(replies);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn heartbeats(&self) -> usize {
        self.count(|call| *call == Call::Heartbeat)
    }

    pub fn beacons(&self) -> usize {
        self.count(|call| *call == Call::Beacon)
    }

    pub fn statuses(&self) -> Vec<PresenceStatus> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Status(status) => Some(status),
                _ => None,
            })
            .collect()
    }

    fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

async fn answer(reply: Reply) -> AppResult<()> {
    match reply {
        Reply::Ok => Ok(()),
        Reply::Fail(kind) => Err(AppError::new(kind, "mock failure")),
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }
}

pub fn session() -> SessionRecord {
    SessionRecord {
        id: SessionId("sess-1".to_string()),
        device: Some("Laptop".to_string()),
        browser: Some("Firefox".to_string()),
        os: None,
        status: PresenceStatus::Offline,
        last_activity_at: None,
        is_current: true,
    }
}

#[async_trait]
impl SessionApi for MockSessionApi {
    async fn current_session(&self) -> AppResult<SessionRecord> {
        self.record(Call::CurrentSession);
        let reply = *self.lookup.lock().unwrap();
        answer(reply).await.map(|()| session())
    }

    async fn heartbeat(&self) -> AppResult<()> {
        self.record(Call::Heartbeat);
        let scripted = self.heartbeat_script.lock().unwrap().pop_front();
        let reply = scripted.unwrap_or_else(|| *self.heartbeat.lock().unwrap());
        answer(reply).await
    }

    async fn update_status(&self, status: PresenceStatus) -> AppResult<()> {
        self.record(Call::Status(status));
        let reply = *self.status.lock().unwrap();
        answer(reply).await
    }

    fn send_offline_beacon(&self) {
        self.record(Call::Beacon);
    }
}

/// [`TokioScheduler`] that remembers every timer it created.
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    inner: TokioScheduler,
    one_shots: Mutex<Vec<CancellationToken>>,
    periodics: Mutex<Vec<CancellationToken>>,
}

impl RecordingScheduler {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn one_shots(&self) -> usize {
        self.one_shots.lock().unwrap().len()
    }

    pub fn periodics(&self) -> usize {
        self.periodics.lock().unwrap().len()
    }

    pub fn active_one_shots(&self) -> usize {
        Self::active(&self.one_shots)
    }

    pub fn active_periodics(&self) -> usize {
        Self::active(&self.periodics)
    }

    fn active(timers: &Mutex<Vec<CancellationToken>>) -> usize {
        timers
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !t.is_cancelled())
            .count()
    }
}

impl Scheduler for RecordingScheduler {
    fn after(&self, delay: Duration, task: OnceTask) -> TimerHandle {
        let handle = self.inner.after(delay, task);
        self.one_shots.lock().unwrap().push(handle.observer());
        handle
    }

    fn every(&self, period: Duration, task: RepeatTask) -> TimerHandle {
        let handle = self.inner.every(period, task);
        self.periodics.lock().unwrap().push(handle.observer());
        handle
    }
}

/// Tracker over the doubles with default tunables.
pub fn tracker(api: &Arc<MockSessionApi>, scheduler: &Arc<RecordingScheduler>) -> PresenceTracker {
    PresenceTracker::builder(api.clone())
        .scheduler(scheduler.clone())
        .build()
}

/// Tracker that also monitors `hub`.
pub fn tracker_with_signals(
    api: &Arc<MockSessionApi>,
    scheduler: &Arc<RecordingScheduler>,
    hub: &SignalHub,
) -> PresenceTracker {
    PresenceTracker::builder(api.clone())
        .scheduler(scheduler.clone())
        .signals(Arc::new(hub.clone()))
        .build()
}

/// Let spawned tasks run on the paused clock.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}
