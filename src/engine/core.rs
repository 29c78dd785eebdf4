//! AttentionTracker: the engine handle shared by the CLI and embedders.
//!
//! Wires the injected backends (camera, landmark model, frame clock, time
//! source) to a [`LifecycleController`] and publishes tick reports and
//! lifecycle events over tokio broadcast channels.
//!
//! The controller lives behind a `std::sync::Mutex` that is only ever held
//! for synchronous sections; it is released before every `.await` in
//! [`AttentionTracker::start`], which is what lets a `stop()` slip in while a
//! start is suspended on acquisition.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::engine::backend::{
    CameraBackend, ModelLoader, SimulatedCamera, SyntheticModelLoader, TimeSource, VideoStream,
};
use crate::engine::clock::{FrameClock, FrameRequestId, FrameTicker};
use crate::engine::events::{TrackerEvent, TrackerEventKind};
use crate::engine::lifecycle::{
    LifecycleController, LifecycleState, SessionSummary, StartCompletion, StartTicket, StopOutcome,
};
use crate::engine::scheduler::{TickOutcome, TickReport};
use crate::error::{log_acquisition_error, AcquisitionError};
use crate::managers::BroadcastChannelManager;
use crate::overlay::OverlayGeometry;

/// External collaborators injected into the tracker.
#[derive(Clone)]
pub struct TrackerBackends {
    pub camera: Arc<dyn CameraBackend>,
    pub models: Arc<dyn ModelLoader>,
    pub clock: Arc<dyn FrameClock>,
    pub time_source: Arc<dyn TimeSource>,
}

/// Parameters of the simulated camera and synthetic face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOptions {
    pub seed: u64,
    /// Maximum per-frame head movement
    pub drift: f64,
    /// Probability that a frame has no face
    pub absence_rate: f64,
    pub video_fps: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            drift: 0.02,
            absence_rate: 0.05,
            video_fps: 30.0,
        }
    }
}

impl TrackerBackends {
    /// Simulated camera plus synthetic landmark model.
    ///
    /// # Arguments
    /// * `options` - Synthetic face and video parameters
    /// * `clock` - Frame clock the tracker arms requests on
    /// * `time_source` - Drives video timestamps; use a
    ///   [`StubTimeSource`](crate::engine::backend::StubTimeSource)
    ///   for reproducible runs
    pub fn simulated(
        options: SimulationOptions,
        clock: Arc<dyn FrameClock>,
        time_source: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            camera: Arc::new(SimulatedCamera::new(
                Arc::clone(&time_source),
                options.video_fps,
            )),
            models: Arc::new(SyntheticModelLoader::new(
                options.seed,
                options.drift,
                options.absence_rate,
            )),
            clock,
            time_source,
        }
    }
}

/// Attention tracking engine.
pub struct AttentionTracker {
    config: AppConfig,
    backends: TrackerBackends,
    controller: Mutex<LifecycleController>,
    broadcasts: BroadcastChannelManager,
    start_instant: Instant,
}

impl AttentionTracker {
    pub fn new(config: AppConfig, backends: TrackerBackends) -> Self {
        let controller = LifecycleController::new(config.smoothing.history_capacity);
        let broadcasts = BroadcastChannelManager::new(config.scheduler.event_buffer);
        let start_instant = backends.time_source.now();

        Self {
            config,
            backends,
            controller: Mutex::new(controller),
            broadcasts,
            start_instant,
        }
    }

    fn lock_controller(&self) -> MutexGuard<'_, LifecycleController> {
        self.controller.lock().unwrap_or_else(|poisoned| {
            let err = AcquisitionError::LockPoisoned {
                component: "LifecycleController".to_string(),
            };
            log_acquisition_error(&err, "AttentionTracker", "lock_controller");
            poisoned.into_inner()
        })
    }

    fn elapsed_ms(&self) -> f64 {
        self.backends
            .time_source
            .now()
            .saturating_duration_since(self.start_instant)
            .as_secs_f64()
            * 1000.0
    }

    fn emit_event(&self, kind: TrackerEventKind, detail: Option<String>) {
        let timestamp_ms = self.elapsed_ms() as u64;
        log::info!("[AttentionTracker] {}", kind.status_message());
        self.broadcasts.publish_event(TrackerEvent {
            timestamp_ms,
            kind,
            detail,
        });
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start tracking.
    ///
    /// No-op when not idle. Loads the landmark model on the first start only,
    /// then opens the camera and arms the first frame.
    ///
    /// # Returns
    /// * `Ok(())` - Running, or the start was cancelled by `stop()`, or
    ///   tracking was already active
    /// * `Err(AcquisitionError)` - Model or camera could not be acquired;
    ///   the tracker is back to idle
    pub async fn start(&self) -> Result<(), AcquisitionError> {
        let ticket = self.lock_controller().begin_start();
        let Some(ticket) = ticket else {
            return Ok(());
        };

        if ticket.needs_model() {
            self.emit_event(TrackerEventKind::ModelLoading, None);
            let loaded = self.backends.models.load(&self.config.model).await;
            match loaded {
                Ok(probe) => {
                    self.lock_controller().install_probe(probe);
                }
                Err(err) => return self.finish_start(ticket, Err(err)),
            }
        }

        if !self.lock_controller().is_pending(ticket) {
            log::info!("[AttentionTracker] Start cancelled before camera acquisition");
            return Ok(());
        }

        let acquired = self.backends.camera.acquire(&self.config.camera).await;
        self.finish_start(ticket, acquired)
    }

    fn finish_start(
        &self,
        ticket: StartTicket,
        acquired: Result<Box<dyn VideoStream>, AcquisitionError>,
    ) -> Result<(), AcquisitionError> {
        let completion = self.lock_controller().complete_start(
            ticket,
            acquired,
            self.backends.clock.as_ref(),
            self.backends.camera.as_ref(),
        );

        match completion {
            Ok(StartCompletion::Started) => {
                self.emit_event(TrackerEventKind::Started, None);
                Ok(())
            }
            Ok(StartCompletion::Cancelled) => Ok(()),
            Err(err) => {
                self.emit_event(
                    TrackerEventKind::AcquisitionFailed {
                        reason: err.reason(),
                    },
                    Some(err.to_string()),
                );
                Err(err)
            }
        }
    }

    /// Stop tracking and release the camera. Safe to call at any time.
    pub fn stop(&self) -> StopOutcome {
        let outcome = self
            .lock_controller()
            .stop(self.backends.clock.as_ref(), self.backends.camera.as_ref());

        if outcome != StopOutcome::AlreadyIdle {
            self.emit_event(TrackerEventKind::Stopped, None);
        }
        outcome
    }

    /// Frame callback for a fired request from the frame clock.
    ///
    /// Evaluated frames are published on the tick channel. Stale ids (for
    /// example a frame that was already queued when `stop()` ran) are
    /// ignored.
    pub fn on_frame(&self, id: FrameRequestId) -> Option<TickOutcome> {
        let now_ms = self.elapsed_ms();
        let outcome = self
            .lock_controller()
            .on_frame(id, self.backends.clock.as_ref(), now_ms);

        if let Some(report) = outcome.as_ref().and_then(TickOutcome::report) {
            self.broadcasts.publish_tick(*report);
        }
        outcome
    }

    /// Pump frames from an interval clock until the loop is stopped.
    ///
    /// # Arguments
    /// * `ticker` - Driver half of the tracker's `IntervalFrameClock`
    /// * `max_frames` - Return after this many callbacks, leaving the loop
    ///   running
    ///
    /// # Returns
    /// Number of frame callbacks delivered
    pub async fn run(&self, ticker: &mut FrameTicker, max_frames: Option<u64>) -> u64 {
        let mut delivered = 0;
        while max_frames.map_or(true, |max| delivered < max) {
            let Some(id) = ticker.next_frame().await else {
                break;
            };
            self.on_frame(id);
            delivered += 1;
        }
        delivered
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn is_running(&self) -> bool {
        self.lock_controller().is_running()
    }

    pub fn state(&self) -> LifecycleState {
        self.lock_controller().state()
    }

    pub fn session_average(&self) -> Option<u8> {
        self.lock_controller().session_average()
    }

    pub fn session_summary(&self) -> SessionSummary {
        self.lock_controller().session_summary()
    }

    pub fn overlay(&self) -> Option<OverlayGeometry> {
        self.lock_controller().overlay()
    }

    /// Failure of the most recent start, cleared by the next start.
    pub fn last_error(&self) -> Option<AcquisitionError> {
        self.lock_controller().last_error().cloned()
    }

    /// Clear the session samples. Refused (returns `false`) while running.
    pub fn reset_session(&self) -> bool {
        self.lock_controller().reset_session()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    // ========================================================================
    // STREAMS
    // ========================================================================

    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickReport> {
        self.broadcasts.subscribe_ticks()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TrackerEvent> {
        self.broadcasts.subscribe_events()
    }
}

impl Drop for AttentionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
