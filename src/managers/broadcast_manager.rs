// BroadcastChannelManager: tokio broadcast channels for tick reports and
// lifecycle events

use tokio::sync::broadcast;

use crate::engine::events::TrackerEvent;
use crate::engine::scheduler::TickReport;

/// Owns the tracker's broadcast channels.
///
/// Both channels are created up front so that a UI can subscribe before the
/// first `start()`. Publishing never blocks the frame loop: with no receiver
/// the message is dropped, and a slow receiver lags instead of applying
/// back-pressure.
///
/// # Channel Types
/// - Ticks: one [`TickReport`] per evaluated frame (score, status, overlay)
/// - Events: [`TrackerEvent`] on lifecycle transitions (loading, started,
///   stopped, acquisition failed)
pub struct BroadcastChannelManager {
    ticks: broadcast::Sender<TickReport>,
    events: broadcast::Sender<TrackerEvent>,
}

impl BroadcastChannelManager {
    /// Create both channels.
    ///
    /// # Arguments
    /// * `capacity` - Buffered messages per channel before receivers lag; 0 is
    ///   treated as 1
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (ticks, _) = broadcast::channel(capacity);
        let (events, _) = broadcast::channel(capacity);
        Self { ticks, events }
    }

    // ========================================================================
    // TICK CHANNEL
    // ========================================================================

    /// Publish a tick report.
    ///
    /// # Returns
    /// Number of receivers that got the report (0 when nobody listens)
    pub fn publish_tick(&self, report: TickReport) -> usize {
        self.ticks.send(report).unwrap_or(0)
    }

    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickReport> {
        self.ticks.subscribe()
    }

    // ========================================================================
    // EVENT CHANNEL
    // ========================================================================

    /// Publish a lifecycle event.
    ///
    /// # Returns
    /// Number of receivers that got the event
    pub fn publish_event(&self, event: TrackerEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.events.subscribe()
    }

    pub fn receiver_counts(&self) -> (usize, usize) {
        (self.ticks.receiver_count(), self.events.receiver_count())
    }
}

impl Default for BroadcastChannelManager {
    fn default() -> Self {
        Self::new(128)
    }
}
