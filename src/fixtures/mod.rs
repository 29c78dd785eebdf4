//! Fixture utilities for the deterministic CLI harness.
//!
//! A fixture is a JSON-lines recording of detector output, one video frame
//! per line:
//!
//! ```text
//! {"t": 0.000, "face": {"yaw": 0.0, "pitch": 0.0}}
//! {"t": 0.033, "face": null}
//! {"t": 0.067, "error": "inference timeout"}
//! ```
//!
//! `face` is either a head pose applied to a frontal face, the nine named
//! keypoints, or a raw landmark mesh. Blank lines and lines starting with `#`
//! are ignored. Replaying feeds the recording through a real
//! [`AttentionTracker`] driven by a [`ManualFrameClock`].

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::future::{self, BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, CameraConfig, ModelConfig};
use crate::engine::backend::{
    CameraBackend, LandmarkProbe, ModelLoader, StubTimeSource, VideoFrame, VideoStream,
};
use crate::engine::clock::ManualFrameClock;
use crate::engine::core::{AttentionTracker, TrackerBackends};
use crate::engine::lifecycle::SessionSummary;
use crate::engine::scheduler::TickReport;
use crate::error::{AcquisitionError, LandmarkError};
use crate::landmarks::{FaceLandmarkSet, KeyLandmarks};

/// Default location for fixture recordings.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

const FIXTURE_EXTENSION: &str = "jsonl";

/// Face observation recorded for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureFace {
    /// Nose offset from the eye line plus eyelid gap
    Pose {
        yaw: f64,
        pitch: f64,
        #[serde(default = "default_eye_gap")]
        eye_gap: f64,
    },
    Keypoints(KeyLandmarks),
    Mesh(FaceLandmarkSet),
}

fn default_eye_gap() -> f64 {
    0.045
}

impl FixtureFace {
    pub fn to_landmarks(&self) -> FaceLandmarkSet {
        match self {
            FixtureFace::Pose {
                yaw,
                pitch,
                eye_gap,
            } => KeyLandmarks::frontal()
                .with_nose_offset(*yaw, *pitch)
                .with_eye_gap(*eye_gap)
                .into_landmark_set(),
            FixtureFace::Keypoints(keypoints) => keypoints.into_landmark_set(),
            FixtureFace::Mesh(mesh) => mesh.clone(),
        }
    }
}

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureFrame {
    /// Video timestamp in seconds
    pub t: f64,
    #[serde(default)]
    pub face: Option<FixtureFace>,
    /// Detector failure to replay for this frame
    #[serde(default)]
    pub error: Option<String>,
}

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub path: PathBuf,
}

/// Loaded fixture recording.
#[derive(Clone, Debug)]
pub struct FixtureData {
    pub metadata: FixtureMetadata,
    pub frames: Vec<FixtureFrame>,
}

/// Parse a JSON-lines recording.
///
/// # Arguments
/// * `text` - File contents
/// * `origin` - Path used in error messages
pub fn parse_frames(text: &str, origin: &Path) -> Result<Vec<FixtureFrame>> {
    let mut frames = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let frame: FixtureFrame = serde_json::from_str(line)
            .with_context(|| format!("parsing {}:{}", origin.display(), line_no + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(FIXTURE_EXTENSION) {
                fixtures.push(Self::metadata_for_path(&path)?);
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by name or path.
    pub fn load(&self, fixture: &str) -> Result<FixtureData> {
        let path = self.resolve_fixture_path(fixture)?;
        let metadata = Self::metadata_for_path(&path)?;
        let text =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let frames = parse_frames(&text, &path)?;
        log::debug!(
            "[FixtureCatalog] Loaded {} frames from {}",
            frames.len(),
            path.display()
        );
        Ok(FixtureData { metadata, frames })
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.{FIXTURE_EXTENSION}"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }

    fn metadata_for_path(path: &Path) -> Result<FixtureMetadata> {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("Invalid fixture name for {}", path.display()))?
            .to_string();
        Ok(FixtureMetadata {
            name,
            path: path.to_path_buf(),
        })
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

// ============================================================================
// REPLAY BACKENDS
// ============================================================================

/// Camera whose stream plays a recording, one frame per read.
pub struct ReplayCamera {
    frames: Arc<Vec<FixtureFrame>>,
    open_streams: Arc<AtomicUsize>,
}

impl ReplayCamera {
    pub fn new(frames: Arc<Vec<FixtureFrame>>) -> Self {
        Self {
            frames,
            open_streams: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }
}

impl CameraBackend for ReplayCamera {
    fn acquire(
        &self,
        constraints: &CameraConfig,
    ) -> BoxFuture<'static, Result<Box<dyn VideoStream>, AcquisitionError>> {
        let result = if self.frames.is_empty() {
            Err(AcquisitionError::CameraUnavailable {
                reason: "fixture has no frames".to_string(),
            })
        } else {
            self.open_streams.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(ReplayStream {
                frames: Arc::clone(&self.frames),
                cursor: 0,
                width: constraints.ideal_width,
                height: constraints.ideal_height,
                open_streams: Arc::clone(&self.open_streams),
                stopped: false,
            }) as Box<dyn VideoStream>)
        };
        future::ready(result).boxed()
    }
}

struct ReplayStream {
    frames: Arc<Vec<FixtureFrame>>,
    cursor: usize,
    width: u32,
    height: u32,
    open_streams: Arc<AtomicUsize>,
    stopped: bool,
}

impl VideoStream for ReplayStream {
    fn current_frame(&mut self) -> VideoFrame {
        // Past the end the last frame stays on screen.
        let index = self.cursor.min(self.frames.len().saturating_sub(1));
        self.cursor += 1;
        let timestamp_secs = self.frames.get(index).map(|frame| frame.t).unwrap_or(0.0);
        VideoFrame {
            timestamp_secs,
            width: if self.stopped { 0 } else { self.width },
            height: if self.stopped { 0 } else { self.height },
            sequence: index as u64,
        }
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Model loader handing out a probe that answers from the recording.
pub struct ReplayModelLoader {
    frames: Arc<Vec<FixtureFrame>>,
}

impl ReplayModelLoader {
    pub fn new(frames: Arc<Vec<FixtureFrame>>) -> Self {
        Self { frames }
    }
}

impl ModelLoader for ReplayModelLoader {
    fn load(
        &self,
        _options: &ModelConfig,
    ) -> BoxFuture<'static, Result<Box<dyn LandmarkProbe>, AcquisitionError>> {
        let probe = ReplayProbe {
            frames: Arc::clone(&self.frames),
        };
        future::ready(Ok(Box::new(probe) as Box<dyn LandmarkProbe>)).boxed()
    }
}

struct ReplayProbe {
    frames: Arc<Vec<FixtureFrame>>,
}

impl LandmarkProbe for ReplayProbe {
    fn detect(
        &mut self,
        frame: &VideoFrame,
        _timestamp_ms: f64,
    ) -> Result<Option<FaceLandmarkSet>, LandmarkError> {
        let recorded = match self.frames.get(frame.sequence as usize) {
            Some(recorded) => recorded,
            None => return Ok(None),
        };
        if let Some(reason) = &recorded.error {
            return Err(LandmarkError::ProbeFailed {
                reason: reason.clone(),
            });
        }
        Ok(recorded.face.as_ref().map(FixtureFace::to_landmarks))
    }
}

// ============================================================================
// REPLAY
// ============================================================================

/// Result of replaying a fixture.
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub fixture: String,
    pub frames: usize,
    pub ticks: Vec<TickReport>,
    pub summary: SessionSummary,
}

/// Replays fixture frames through a tracker, one frame callback per frame.
pub struct FixtureProcessor {
    config: AppConfig,
}

impl FixtureProcessor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, data: &FixtureData) -> Result<ReplayReport> {
        let frames = Arc::new(data.frames.clone());
        let clock = ManualFrameClock::new();
        let backends = TrackerBackends {
            camera: Arc::new(ReplayCamera::new(Arc::clone(&frames))),
            models: Arc::new(ReplayModelLoader::new(Arc::clone(&frames))),
            clock: Arc::new(clock.clone()),
            time_source: Arc::new(StubTimeSource::new()),
        };
        let tracker = AttentionTracker::new(self.config.clone(), backends);

        futures::executor::block_on(tracker.start())
            .with_context(|| format!("starting replay of {}", data.metadata.name))?;

        let mut ticks = Vec::new();
        for _ in 0..frames.len() {
            let Some(id) = clock.fire() else {
                break;
            };
            if let Some(report) = tracker.on_frame(id).as_ref().and_then(|o| o.report()) {
                ticks.push(*report);
            }
        }
        tracker.stop();

        Ok(ReplayReport {
            fixture: data.metadata.name.clone(),
            frames: frames.len(),
            ticks,
            summary: tracker.session_summary(),
        })
    }
}
