//! LifecycleController: start/stop state machine around the frame loop.
//!
//! ```text
//! Idle ──begin_start──▶ Starting ──complete_start(Ok)──▶ Running
//!  ▲                       │                                │
//!  │◀──complete_start(Err)─┤                              stop
//!  │◀──────stop────────────┘                                ▼
//!  └────────────────────────────────────────────────── Stopping
//! ```
//!
//! The controller is the only owner of the running flag, the armed frame
//! request and the acquired camera stream. Acquisition itself happens outside
//! (it may suspend), so a start is split in two halves joined by a
//! [`StartTicket`]. A `stop()` during `Starting` invalidates the ticket and
//! the late acquisition result is released instead of committed.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::engine::backend::{CameraBackend, LandmarkProbe, VideoStream};
use crate::engine::clock::{FrameClock, FrameRequestId};
use crate::engine::scheduler::{FrameScheduler, TickOutcome, TickStats};
use crate::error::{log_acquisition_error, AcquisitionError};
use crate::overlay::OverlayGeometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Starting,
    Running,
    Stopping,
}

/// Proof that `begin_start` moved the controller to `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartTicket {
    generation: u64,
    needs_model: bool,
}

impl StartTicket {
    /// No landmark probe is cached yet; the caller must load the model.
    pub fn needs_model(&self) -> bool {
        self.needs_model
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartCompletion {
    /// Now `Running`; the first frame is armed
    Started,
    /// A `stop()` arrived while acquiring; resources were released
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Was `Running`, now `Idle`
    Stopped,
    /// Was `Starting`; the pending start will not commit
    CancelledStart,
    /// Nothing to stop
    AlreadyIdle,
}

/// Session-level summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Rounded mean of all smoothed scores since the last start
    pub average: Option<u8>,
    /// Number of recorded smoothed scores
    pub samples: usize,
    pub stats: TickStats,
}

pub struct LifecycleController {
    state: LifecycleState,
    generation: u64,
    scheduler: FrameScheduler,
    stream: Option<Box<dyn VideoStream>>,
    probe: Option<Box<dyn LandmarkProbe>>,
    pending_frame: Option<FrameRequestId>,
    overlay: Option<OverlayGeometry>,
    last_error: Option<AcquisitionError>,
}

impl LifecycleController {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            state: LifecycleState::Idle,
            generation: 0,
            scheduler: FrameScheduler::new(history_capacity),
            stream: None,
            probe: None,
            pending_frame: None,
            overlay: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// First half of `start()`.
    ///
    /// # Returns
    /// * `Some(StartTicket)` - Now `Starting`; smoother and recorder reset
    /// * `None` - Not `Idle`, nothing changed
    pub fn begin_start(&mut self) -> Option<StartTicket> {
        if self.state != LifecycleState::Idle {
            debug!(
                "[LifecycleController] start ignored in state {:?}",
                self.state
            );
            return None;
        }

        self.state = LifecycleState::Starting;
        self.generation += 1;
        self.scheduler.reset_session();
        self.overlay = None;
        self.last_error = None;

        Some(StartTicket {
            generation: self.generation,
            needs_model: self.probe.is_none(),
        })
    }

    /// Cache a freshly loaded landmark probe for this and later runs.
    pub fn install_probe(&mut self, probe: Box<dyn LandmarkProbe>) {
        if self.probe.is_none() {
            self.probe = Some(probe);
        }
    }

    /// Second half of `start()`, once acquisition resolved.
    ///
    /// # Arguments
    /// * `ticket` - Ticket returned by `begin_start`
    /// * `acquired` - Camera stream or the acquisition failure
    /// * `clock` - Frame clock used to arm the first tick
    /// * `camera` - Backend to hand a stale stream back to
    ///
    /// # Returns
    /// * `Ok(StartCompletion)` - Started, or cancelled by an earlier stop
    /// * `Err(AcquisitionError)` - Acquisition failed; back to `Idle`
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        acquired: Result<Box<dyn VideoStream>, AcquisitionError>,
        clock: &dyn FrameClock,
        camera: &dyn CameraBackend,
    ) -> Result<StartCompletion, AcquisitionError> {
        if !self.is_pending(ticket) {
            if let Ok(stream) = acquired {
                camera.release(stream);
            }
            info!("[LifecycleController] Start superseded by stop, resources released");
            return Ok(StartCompletion::Cancelled);
        }

        match acquired {
            Ok(stream) => {
                self.stream = Some(stream);
                self.scheduler.reset_timestamp();
                self.state = LifecycleState::Running;
                self.pending_frame = Some(clock.schedule_next());
                info!("[LifecycleController] Running");
                Ok(StartCompletion::Started)
            }
            Err(err) => {
                self.state = LifecycleState::Idle;
                log_acquisition_error(&err, "LifecycleController", "start");
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// `ticket` still belongs to the start in progress.
    pub fn is_pending(&self, ticket: StartTicket) -> bool {
        self.state == LifecycleState::Starting && ticket.generation == self.generation
    }

    /// Stop the loop and release the camera. Safe to call in any state.
    pub fn stop(&mut self, clock: &dyn FrameClock, camera: &dyn CameraBackend) -> StopOutcome {
        match self.state {
            LifecycleState::Running => {
                self.state = LifecycleState::Stopping;
                if let Some(id) = self.pending_frame.take() {
                    clock.cancel(id);
                }
                if let Some(stream) = self.stream.take() {
                    camera.release(stream);
                }
                self.overlay = None;
                self.state = LifecycleState::Idle;
                info!("[LifecycleController] Stopped");
                StopOutcome::Stopped
            }
            LifecycleState::Starting => {
                self.generation += 1;
                self.state = LifecycleState::Idle;
                info!("[LifecycleController] Start cancelled before acquisition finished");
                StopOutcome::CancelledStart
            }
            LifecycleState::Idle | LifecycleState::Stopping => StopOutcome::AlreadyIdle,
        }
    }

    /// Frame callback: run one tick for the armed request, then re-arm.
    ///
    /// # Returns
    /// * `Some(TickOutcome)` - A tick ran
    /// * `None` - Not running, or `id` is not the armed request
    pub fn on_frame(
        &mut self,
        id: FrameRequestId,
        clock: &dyn FrameClock,
        now_ms: f64,
    ) -> Option<TickOutcome> {
        if self.state != LifecycleState::Running || self.pending_frame != Some(id) {
            debug!("[LifecycleController] Ignoring stale frame {:?}", id);
            return None;
        }
        self.pending_frame = None;

        let outcome = match self.stream.as_mut() {
            Some(stream) => {
                let frame = stream.current_frame();
                self.scheduler
                    .tick(&frame, self.probe.as_deref_mut(), now_ms)
            }
            None => TickOutcome::FrameNotReady,
        };

        match &outcome {
            TickOutcome::Detected(report) => self.overlay = report.overlay,
            TickOutcome::NotDetected(_) => self.overlay = None,
            TickOutcome::FrameNotReady | TickOutcome::Deduped => {}
        }

        if self.state == LifecycleState::Running {
            self.pending_frame = Some(clock.schedule_next());
        }
        Some(outcome)
    }

    /// Clear session samples outside of a run.
    ///
    /// # Returns
    /// `false` (and nothing cleared) while starting or running
    pub fn reset_session(&mut self) -> bool {
        match self.state {
            LifecycleState::Idle | LifecycleState::Stopping => {
                self.scheduler.reset_recorder();
                true
            }
            LifecycleState::Starting | LifecycleState::Running => false,
        }
    }

    pub fn session_average(&self) -> Option<u8> {
        self.scheduler.session_average()
    }

    pub fn session_summary(&self) -> SessionSummary {
        SessionSummary {
            average: self.scheduler.session_average(),
            samples: self.scheduler.recorder().len(),
            stats: self.scheduler.stats(),
        }
    }

    /// Geometry of the last detected face, cleared on no-face and on stop.
    pub fn overlay(&self) -> Option<OverlayGeometry> {
        self.overlay
    }

    pub fn last_error(&self) -> Option<&AcquisitionError> {
        self.last_error.as_ref()
    }

    pub fn pending_frame(&self) -> Option<FrameRequestId> {
        self.pending_frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::backend::{SimulatedCamera, StubTimeSource, SyntheticFaceProbe};
    use crate::engine::clock::ManualFrameClock;
    use crate::config::CameraConfig;
    use std::sync::Arc;

    fn camera() -> SimulatedCamera {
        SimulatedCamera::new(Arc::new(StubTimeSource::new()), 30.0)
    }

    fn open(camera: &SimulatedCamera) -> Result<Box<dyn VideoStream>, AcquisitionError> {
        futures::executor::block_on(camera.acquire(&CameraConfig::default()))
    }

    fn running(clock: &ManualFrameClock, camera: &SimulatedCamera) -> LifecycleController {
        let mut controller = LifecycleController::new(8);
        let ticket = controller.begin_start().expect("idle controller starts");
        controller.install_probe(Box::new(SyntheticFaceProbe::new(3, 0.0, 0.0)));
        let completion = controller
            .complete_start(ticket, open(camera), clock, camera)
            .expect("acquisition succeeds");
        assert_eq!(completion, StartCompletion::Started);
        controller
    }

    #[test]
    fn test_start_reaches_running_and_arms_frame() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let controller = running(&clock, &camera);

        assert!(controller.is_running());
        assert_eq!(controller.pending_frame(), clock.pending());
        assert_eq!(camera.open_streams(), 1);
    }

    #[test]
    fn test_begin_start_is_noop_unless_idle() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = running(&clock, &camera);
        assert_eq!(controller.begin_start(), None);
        assert!(controller.is_running());
    }

    #[test]
    fn test_first_start_needs_model_later_ones_do_not() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = LifecycleController::new(8);
        assert!(controller.begin_start().unwrap().needs_model());
        controller.stop(&clock, &camera);

        controller.install_probe(Box::new(SyntheticFaceProbe::new(3, 0.0, 0.0)));
        assert!(!controller.begin_start().unwrap().needs_model());
    }

    #[test]
    fn test_acquisition_failure_returns_to_idle() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = LifecycleController::new(8);
        let ticket = controller.begin_start().unwrap();

        let err = controller
            .complete_start(
                ticket,
                Err(AcquisitionError::PermissionDenied),
                &clock,
                &camera,
            )
            .unwrap_err();

        assert_eq!(err, AcquisitionError::PermissionDenied);
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(controller.last_error(), Some(&AcquisitionError::PermissionDenied));
        assert_eq!(clock.pending(), None);
    }

    #[test]
    fn test_stop_during_starting_discards_late_stream() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = LifecycleController::new(8);
        let ticket = controller.begin_start().unwrap();

        assert_eq!(controller.stop(&clock, &camera), StopOutcome::CancelledStart);
        let completion = controller
            .complete_start(ticket, open(&camera), &clock, &camera)
            .unwrap();

        assert_eq!(completion, StartCompletion::Cancelled);
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(camera.open_streams(), 0);
        assert_eq!(clock.pending(), None);
    }

    #[test]
    fn test_stale_ticket_after_restart_is_rejected() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = LifecycleController::new(8);
        let stale = controller.begin_start().unwrap();
        controller.stop(&clock, &camera);
        let fresh = controller.begin_start().unwrap();

        let completion = controller
            .complete_start(stale, open(&camera), &clock, &camera)
            .unwrap();
        assert_eq!(completion, StartCompletion::Cancelled);
        assert_eq!(controller.state(), LifecycleState::Starting);

        controller.install_probe(Box::new(SyntheticFaceProbe::new(3, 0.0, 0.0)));
        let completion = controller
            .complete_start(fresh, open(&camera), &clock, &camera)
            .unwrap();
        assert_eq!(completion, StartCompletion::Started);
        assert_eq!(camera.open_streams(), 1);
    }

    #[test]
    fn test_stop_cancels_frame_and_releases_camera() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = running(&clock, &camera);
        let armed = clock.pending().unwrap();

        assert_eq!(controller.stop(&clock, &camera), StopOutcome::Stopped);
        assert_eq!(controller.state(), LifecycleState::Idle);
        assert_eq!(clock.pending(), None);
        assert_eq!(camera.open_streams(), 0);
        assert_eq!(controller.overlay(), None);

        // A callback that was already queued must not tick.
        assert_eq!(controller.on_frame(armed, &clock, 0.0), None);
        assert_eq!(controller.stop(&clock, &camera), StopOutcome::AlreadyIdle);
    }

    #[test]
    fn test_on_frame_ticks_and_rearms() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = running(&clock, &camera);

        let id = clock.fire().unwrap();
        let outcome = controller.on_frame(id, &clock, 0.0).expect("tick runs");
        assert!(matches!(outcome, TickOutcome::Detected(_)));
        assert!(controller.overlay().is_some());
        assert!(clock.pending().is_some());
        assert_eq!(controller.session_summary().samples, 1);
    }

    #[test]
    fn test_on_frame_rejects_unknown_id() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = running(&clock, &camera);
        assert_eq!(controller.on_frame(FrameRequestId(999), &clock, 0.0), None);
    }

    #[test]
    fn test_reset_session_refused_while_running() {
        let clock = ManualFrameClock::new();
        let camera = camera();
        let mut controller = running(&clock, &camera);
        let id = clock.fire().unwrap();
        controller.on_frame(id, &clock, 0.0);

        assert!(!controller.reset_session());
        assert_eq!(controller.session_summary().samples, 1);

        controller.stop(&clock, &camera);
        assert!(controller.reset_session());
        assert_eq!(controller.session_average(), None);
    }
}
