//! Timer capability used by the presence tracker.
//!
//! The tracker never touches runtime timer primitives directly. It asks a
//! [`Scheduler`] for one-shot or periodic callbacks and keeps the returned
//! [`TimerHandle`], which cancels the timer when cancelled or dropped.

use std::fmt;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// One-shot timer callback.
pub type OnceTask = Box<dyn FnOnce() + Send + 'static>;

/// Periodic timer callback.
pub type RepeatTask = Box<dyn Fn() + Send + Sync + 'static>;

/// Schedules callbacks after a delay or on a fixed period.
///
/// Callbacks must never run inline from `after`/`every`: the tracker
/// schedules while holding its state lock, and the callbacks take that
/// lock again.
pub trait Scheduler: Send + Sync + fmt::Debug + 'static {
    /// Run `task` once after `delay`.
    fn after(&self, delay: Duration, task: OnceTask) -> TimerHandle;

    /// Run `task` every `period`, first after one full period.
    fn every(&self, period: Duration, task: RepeatTask) -> TimerHandle;
}

/// Owning handle to a scheduled timer.
///
/// Cancelling is idempotent. Dropping the handle cancels the timer.
#[derive(Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Wrap a cancellation token. The timer must stop once it is cancelled
    /// and should cancel it itself when it finishes on its own.
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Stop the timer. Safe to call any number of times.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the timer is still pending (not cancelled and not finished).
    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// A non-owning observer of the timer's state.
    pub fn observer(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Shortest period accepted by [`TokioScheduler::every`].
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// [`Scheduler`] backed by tasks spawned on a captured runtime handle.
///
/// Timers can be scheduled from any thread, including threads outside the
/// runtime. Under a paused test clock the timers follow virtual time.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Scheduler on the current runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Use
    /// [`with_handle`](Self::with_handle) to pick the runtime explicitly.
    pub fn new() -> Self {
        Self::with_handle(Handle::current())
    }

    /// Scheduler spawning its timers on `handle`.
    pub fn with_handle(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, task: OnceTask) -> TimerHandle {
        let token = CancellationToken::new();
        let timer = token.clone();

        self.handle.spawn(async move {
            tokio::select! {
                biased;
                _ = timer.cancelled() => {
                    trace!("One-shot timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    timer.cancel();
                    task();
                }
            }
        });

        TimerHandle::new(token)
    }

    /// Periods shorter than [`MIN_PERIOD`] are raised to it.
    fn every(&self, period: Duration, task: RepeatTask) -> TimerHandle {
        let period = period.max(MIN_PERIOD);
        let token = CancellationToken::new();
        let timer = token.clone();

        self.handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = timer.cancelled() => break,
                    _ = ticker.tick() => task(),
                }
            }
            trace!("Periodic timer stopped");
        });

        TimerHandle::new(token)
    }
}
