//! Frame clocks: the "run on next display refresh" primitive.
//!
//! The lifecycle controller arms at most one frame request at a time through
//! [`FrameClock::schedule_next`] and withdraws it with [`FrameClock::cancel`].
//! Whoever drives the clock hands the fired [`FrameRequestId`] back to
//! `AttentionTracker::on_frame`, which is the callback of the request.
//!
//! - [`ManualFrameClock`]: fires only when told to; deterministic tests and
//!   fixture replay
//! - [`IntervalFrameClock`]: fires on a tokio interval at the display rate

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::{self, Interval, MissedTickBehavior};

/// Identifies one armed frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRequestId(pub u64);

/// Scheduling primitive injected into the engine.
pub trait FrameClock: Send + Sync {
    /// Arm a callback for the next display frame.
    fn schedule_next(&self) -> FrameRequestId;

    /// Withdraw a request. Firing a cancelled id must never reach the engine.
    fn cancel(&self, id: FrameRequestId);
}

/// Pending-request bookkeeping shared by the clock implementations.
#[derive(Debug, Default)]
struct FrameRequests {
    next_id: u64,
    pending: Option<FrameRequestId>,
    scheduled: u64,
    cancelled: u64,
}

impl FrameRequests {
    fn schedule(&mut self) -> FrameRequestId {
        self.next_id += 1;
        self.scheduled += 1;
        let id = FrameRequestId(self.next_id);
        self.pending = Some(id);
        id
    }

    fn cancel(&mut self, id: FrameRequestId) {
        if self.pending == Some(id) {
            self.pending = None;
            self.cancelled += 1;
        }
    }

    fn take(&mut self) -> Option<FrameRequestId> {
        self.pending.take()
    }
}

fn lock(requests: &Mutex<FrameRequests>) -> MutexGuard<'_, FrameRequests> {
    requests.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock that fires only on [`ManualFrameClock::fire`].
///
/// Cheap to clone; clones share the same request state, so one copy can be
/// handed to the tracker while the test keeps another.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameClock {
    requests: Arc<Mutex<FrameRequests>>,
}

impl ManualFrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the armed request, if any, consuming it.
    pub fn fire(&self) -> Option<FrameRequestId> {
        lock(&self.requests).take()
    }

    /// Peek at the armed request without consuming it.
    pub fn pending(&self) -> Option<FrameRequestId> {
        lock(&self.requests).pending
    }

    /// Total requests armed since creation.
    pub fn scheduled_count(&self) -> u64 {
        lock(&self.requests).scheduled
    }

    /// Total requests withdrawn before firing.
    pub fn cancelled_count(&self) -> u64 {
        lock(&self.requests).cancelled
    }
}

impl FrameClock for ManualFrameClock {
    fn schedule_next(&self) -> FrameRequestId {
        lock(&self.requests).schedule()
    }

    fn cancel(&self, id: FrameRequestId) {
        lock(&self.requests).cancel(id);
    }
}

/// Clock firing at a fixed display refresh rate on the tokio timer.
#[derive(Debug, Clone)]
pub struct IntervalFrameClock {
    period: Duration,
    requests: Arc<Mutex<FrameRequests>>,
}

impl IntervalFrameClock {
    /// # Arguments
    /// * `frame_rate_hz` - Display refresh rate; 0 is treated as 1
    pub fn new(frame_rate_hz: u32) -> Self {
        let hz = frame_rate_hz.max(1) as u64;
        Self {
            period: Duration::from_micros(1_000_000 / hz),
            requests: Arc::new(Mutex::new(FrameRequests::default())),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Create the driver side of the clock. Must be called inside a tokio
    /// runtime.
    pub fn ticker(&self) -> FrameTicker {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        FrameTicker {
            interval,
            requests: Arc::clone(&self.requests),
        }
    }
}

impl FrameClock for IntervalFrameClock {
    fn schedule_next(&self) -> FrameRequestId {
        lock(&self.requests).schedule()
    }

    fn cancel(&self, id: FrameRequestId) {
        lock(&self.requests).cancel(id);
    }
}

/// Driver half of an [`IntervalFrameClock`].
pub struct FrameTicker {
    interval: Interval,
    requests: Arc<Mutex<FrameRequests>>,
}

impl FrameTicker {
    /// Wait for the next display refresh and return the armed request.
    ///
    /// Returns `None` once nothing is armed at a refresh, which happens after
    /// the loop has been stopped.
    pub async fn next_frame(&mut self) -> Option<FrameRequestId> {
        self.interval.tick().await;
        lock(&self.requests).take()
    }
}
