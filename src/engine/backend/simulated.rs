use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{self, BoxFuture, FutureExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{CameraConfig, ModelConfig};
use crate::error::{AcquisitionError, LandmarkError};
use crate::landmarks::{FaceLandmarkSet, KeyLandmarks};

use super::{CameraBackend, LandmarkProbe, ModelLoader, TimeSource, VideoFrame, VideoStream};

/// Camera backend producing blank frames at a fixed video frame rate.
///
/// Used by the CLI `simulate` command and by tests. Frame timestamps are
/// derived from the injected [`TimeSource`], so a display clock running
/// faster than `video_fps` sees repeated timestamps.
pub struct SimulatedCamera {
    time_source: Arc<dyn TimeSource>,
    video_fps: f64,
    failure: Option<AcquisitionError>,
    open_streams: Arc<AtomicUsize>,
}

impl SimulatedCamera {
    pub fn new(time_source: Arc<dyn TimeSource>, video_fps: f64) -> Self {
        Self {
            time_source,
            video_fps: video_fps.max(1.0),
            failure: None,
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make every `acquire` fail with `err`.
    pub fn failing(mut self, err: AcquisitionError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Streams acquired and not yet released.
    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

impl CameraBackend for SimulatedCamera {
    fn acquire(
        &self,
        constraints: &CameraConfig,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquisitionError>> {
        let result = match &self.failure {
            Some(err) => Err(err.clone()),
            None => {
                self.open_streams.fetch_add(1, Ordering::SeqCst);
                let stream = SimulatedStream {
                    time_source: Arc::clone(&self.time_source),
                    started: self.time_source.now(),
                    video_fps: self.video_fps,
                    width: constraints.ideal_width,
                    height: constraints.ideal_height,
                    open_streams: Arc::clone(&self.open_streams),
                    stopped: false,
                };
                Ok(Box::new(stream) as Box<dyn VideoStream>)
            }
        };
        future::ready(result).boxed()
    }
}

struct SimulatedStream {
    time_source: Arc<dyn TimeSource>,
    started: Instant,
    video_fps: f64,
    width: u32,
    height: u32,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for SimulatedStream {
    fn current_frame(&mut self) -> VideoFrame {
        let elapsed = self
            .time_source
            .now()
            .saturating_duration_since(self.started)
            .as_secs_f64();
        let sequence = (elapsed * self.video_fps).floor() as u64;
        VideoFrame {
            timestamp_secs: sequence as f64 / self.video_fps,
            width: if self.stopped { 0 } else { self.width },
            height: if self.stopped { 0 } else { self.height },
            sequence,
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Landmark probe generating a jittering frontal face.
///
/// Head pose follows a mean-reverting random walk; eyes blink now and then
/// and the face occasionally leaves the frame.
pub struct SyntheticFaceProbe {
    rng: StdRng,
    drift: f64,
    absence_rate: f64,
    yaw: f64,
    pitch: f64,
}

impl SyntheticFaceProbe {
    const BLINK_RATE: f64 = 0.05;
    const REVERSION: f64 = 0.9;
    const MAX_OFFSET: f64 = 0.15;

    /// # Arguments
    /// * `seed` - RNG seed, same seed gives the same face track
    /// * `drift` - Maximum per-frame change of the nose offset
    /// * `absence_rate` - Probability in [0, 1] that a frame has no face
    ///
    /// Non-finite `drift` or `absence_rate` is treated as 0.0.
    pub fn new(seed: u64, drift: f64, absence_rate: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            drift: finite_or_zero(drift).abs(),
            absence_rate: finite_or_zero(absence_rate).clamp(0.0, 1.0),
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    fn step(&mut self, value: f64) -> f64 {
        let delta = self.rng.gen_range(-self.drift..=self.drift);
        (value * Self::REVERSION + delta).clamp(-Self::MAX_OFFSET, Self::MAX_OFFSET)
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl LandmarkProbe for SyntheticFaceProbe {
    fn detect(
        &mut self,
        _frame: &VideoFrame,
        _timestamp_ms: f64,
    ) -> Result<Option<FaceLandmarkSet>, LandmarkError> {
        if self.rng.gen_bool(self.absence_rate) {
            return Ok(None);
        }

        self.yaw = self.step(self.yaw);
        self.pitch = self.step(self.pitch);
        let gap = if self.rng.gen_bool(Self::BLINK_RATE) {
            0.01
        } else {
            0.045
        };

        let face = KeyLandmarks::frontal()
            .with_nose_offset(self.yaw, self.pitch)
            .with_eye_gap(gap);
        Ok(Some(face.into_landmark_set()))
    }
}

/// Model loader handing out [`SyntheticFaceProbe`]s.
pub struct SyntheticModelLoader {
    seed: u64,
    drift: f64,
    absence_rate: f64,
    failure: Option<AcquisitionError>,
    loads: Arc<AtomicUsize>,
}

impl SyntheticModelLoader {
    pub fn new(seed: u64, drift: f64, absence_rate: f64) -> Self {
        Self {
            seed,
            drift,
            absence_rate,
            failure: None,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(mut self, err: AcquisitionError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Number of successful loads so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for SyntheticModelLoader {
    fn load(
        &self,
        options: &ModelConfig,
    ) -> BoxFuture<'static, Result<Box<dyn LandmarkProbe>, AcquisitionError>> {
        let result = match &self.failure {
            Some(err) => Err(err.clone()),
            None => {
                log::debug!(
                    "[SyntheticModelLoader] Loading synthetic model in place of {}",
                    options.model_asset_path
                );
                self.loads.fetch_add(1, Ordering::SeqCst);
                let probe = SyntheticFaceProbe::new(self.seed, self.drift, self.absence_rate);
                Ok(Box::new(probe) as Box<dyn LandmarkProbe>)
            }
        };
        future::ready(result).boxed()
    }
}

/// Deterministic time source for simulated runs.
///
/// Each call to `now()` advances by a fixed step (10ms by default) to
/// guarantee monotonic timestamps without a real clock.
pub struct StubTimeSource {
    start: Instant,
    step: Duration,
    offset_nanos: AtomicU64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(10))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            start: Instant::now(),
            step,
            offset_nanos: AtomicU64::new(0),
        }
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now(&self) -> Instant {
        let step = u64::try_from(self.step.as_nanos()).unwrap_or(u64::MAX);
        let nanos = self.offset_nanos.fetch_add(step, Ordering::SeqCst);
        self.start + Duration::from_nanos(nanos)
    }
}
