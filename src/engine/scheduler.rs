//! FrameScheduler: one evaluation of the attention pipeline per video frame.
//!
//! Each tick:
//! 1. Skips frames the video source has not decoded yet
//! 2. Skips frames whose timestamp was already processed (dedup)
//! 3. Asks the landmark probe for a face
//! 4. Detected: AttentionEstimator → ScoreSmoother → SessionRecorder → status
//! 5. Not detected, invalid set or probe failure: report "no face", record
//!    nothing
//!
//! Re-arming the next tick belongs to the lifecycle controller.

use serde::{Deserialize, Serialize};

use crate::analysis::{AttentionEstimator, AttentionStatus, ScoreSmoother, SessionRecorder};
use crate::engine::backend::{LandmarkProbe, VideoFrame};
use crate::error::log_landmark_error;
use crate::overlay::OverlayGeometry;

/// What the UI layer receives for an evaluated frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Media timestamp of the evaluated frame (seconds)
    pub video_timestamp: f64,
    /// Rolling-mean score, `None` when no face was scored
    pub smoothed_score: Option<u8>,
    /// Single-frame score before smoothing
    pub instantaneous_score: Option<u8>,
    pub status: AttentionStatus,
    pub overlay: Option<OverlayGeometry>,
}

impl TickReport {
    fn no_face(video_timestamp: f64) -> Self {
        Self {
            video_timestamp,
            smoothed_score: None,
            instantaneous_score: None,
            status: AttentionStatus::NoFaceDetected,
            overlay: None,
        }
    }
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// No decoded frame (or no model) yet; nothing evaluated
    FrameNotReady,
    /// Same video timestamp as the previous tick; nothing evaluated
    Deduped,
    /// A face was scored and recorded
    Detected(TickReport),
    /// No usable face; nothing recorded
    NotDetected(TickReport),
}

impl TickOutcome {
    /// The report to publish, for evaluated frames only.
    pub fn report(&self) -> Option<&TickReport> {
        match self {
            TickOutcome::Detected(report) | TickOutcome::NotDetected(report) => Some(report),
            TickOutcome::FrameNotReady | TickOutcome::Deduped => None,
        }
    }
}

/// Per-session tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    pub detected: u64,
    pub no_face: u64,
    /// Frames where the probe failed or returned a malformed set
    pub invalid: u64,
    pub deduped: u64,
    pub not_ready: u64,
}

impl TickStats {
    pub fn evaluated(&self) -> u64 {
        self.detected + self.no_face + self.invalid
    }
}

/// Owns the smoothing window, the session samples and the dedup timestamp.
pub struct FrameScheduler {
    estimator: AttentionEstimator,
    smoother: ScoreSmoother,
    recorder: SessionRecorder,
    last_timestamp: Option<f64>,
    stats: TickStats,
}

impl FrameScheduler {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            estimator: AttentionEstimator::new(),
            smoother: ScoreSmoother::new(history_capacity),
            recorder: SessionRecorder::new(),
            last_timestamp: None,
            stats: TickStats::default(),
        }
    }

    /// Clear smoothing window, session samples and counters for a new run.
    pub fn reset_session(&mut self) {
        self.smoother.reset();
        self.recorder.reset();
        self.stats = TickStats::default();
    }

    /// Forget the last processed timestamp so the next frame is evaluated.
    pub fn reset_timestamp(&mut self) {
        self.last_timestamp = None;
    }

    /// Clear only the session samples, leaving the smoothing window intact.
    pub fn reset_recorder(&mut self) {
        self.recorder.reset();
    }

    /// Run one tick.
    ///
    /// # Arguments
    /// * `frame` - Frame currently shown by the video source
    /// * `probe` - Landmark detector, `None` while the model is unavailable
    /// * `now_ms` - Monotonic wall-clock timestamp handed to the detector
    pub fn tick(
        &mut self,
        frame: &VideoFrame,
        probe: Option<&mut (dyn LandmarkProbe + '_)>,
        now_ms: f64,
    ) -> TickOutcome {
        let probe = match probe {
            Some(probe) if frame.is_ready() => probe,
            _ => {
                self.stats.not_ready += 1;
                return TickOutcome::FrameNotReady;
            }
        };

        if self.last_timestamp == Some(frame.timestamp_secs) {
            self.stats.deduped += 1;
            return TickOutcome::Deduped;
        }
        self.last_timestamp = Some(frame.timestamp_secs);

        let landmarks = match probe.detect(frame, now_ms) {
            Ok(Some(landmarks)) => landmarks,
            Ok(None) => {
                self.stats.no_face += 1;
                tracing::debug!(
                    "[FrameScheduler] No face at t={:.3}s",
                    frame.timestamp_secs
                );
                return TickOutcome::NotDetected(TickReport::no_face(frame.timestamp_secs));
            }
            Err(err) => {
                self.stats.invalid += 1;
                log_landmark_error(&err, "detect");
                return TickOutcome::NotDetected(TickReport::no_face(frame.timestamp_secs));
            }
        };

        let sample = match self.estimator.estimate(&landmarks) {
            Ok(sample) => sample,
            Err(err) => {
                self.stats.invalid += 1;
                log_landmark_error(&err, "estimate");
                return TickOutcome::NotDetected(TickReport::no_face(frame.timestamp_secs));
            }
        };

        let smoothed = self.smoother.push(sample.score);
        self.recorder.record(smoothed);
        self.stats.detected += 1;

        let status = AttentionStatus::from_score(smoothed);
        tracing::debug!(
            "[FrameScheduler] t={:.3}s score={} smoothed={} status={:?}",
            frame.timestamp_secs,
            sample.score,
            smoothed,
            status
        );

        TickOutcome::Detected(TickReport {
            video_timestamp: frame.timestamp_secs,
            smoothed_score: Some(smoothed),
            instantaneous_score: Some(sample.score),
            status,
            overlay: Some(sample.geometry),
        })
    }

    pub fn session_average(&self) -> Option<u8> {
        self.recorder.average()
    }

    pub fn recorder(&self) -> &SessionRecorder {
        &self.recorder
    }

    pub fn smoother(&self) -> &ScoreSmoother {
        &self.smoother
    }

    pub fn stats(&self) -> TickStats {
        self.stats
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LandmarkError;
    use crate::landmarks::{FaceLandmarkSet, KeyLandmarks};
    use std::collections::VecDeque;

    /// Probe replaying a fixed script of detector results.
    struct ScriptedProbe {
        script: VecDeque<Result<Option<FaceLandmarkSet>, LandmarkError>>,
        calls: usize,
    }

    impl ScriptedProbe {
        fn new(script: Vec<Result<Option<FaceLandmarkSet>, LandmarkError>>) -> Self {
            Self {
                script: script.into(),
                calls: 0,
            }
        }
    }

    impl LandmarkProbe for ScriptedProbe {
        fn detect(
            &mut self,
            _frame: &VideoFrame,
            _timestamp_ms: f64,
        ) -> Result<Option<FaceLandmarkSet>, LandmarkError> {
            self.calls += 1;
            self.script.pop_front().unwrap_or(Ok(None))
        }
    }

    fn frame(timestamp_secs: f64) -> VideoFrame {
        VideoFrame {
            timestamp_secs,
            width: 640,
            height: 360,
            sequence: 0,
        }
    }

    fn face() -> Result<Option<FaceLandmarkSet>, LandmarkError> {
        Ok(Some(KeyLandmarks::frontal().into_landmark_set()))
    }

    #[test]
    fn test_detected_tick_records_smoothed_score() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![face()]);

        let outcome = scheduler.tick(&frame(0.1), Some(&mut probe), 0.0);
        match outcome {
            TickOutcome::Detected(report) => {
                assert_eq!(report.smoothed_score, Some(100));
                assert_eq!(report.status, AttentionStatus::Focused);
                assert!(report.overlay.is_some());
            }
            other => panic!("Expected Detected, got {:?}", other),
        }
        assert_eq!(scheduler.recorder().samples(), &[100]);
        assert_eq!(scheduler.smoother().len(), 1);
    }

    #[test]
    fn test_duplicate_timestamp_is_noop() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![face(), face()]);

        scheduler.tick(&frame(0.5), Some(&mut probe), 0.0);
        let outcome = scheduler.tick(&frame(0.5), Some(&mut probe), 16.0);

        assert_eq!(outcome, TickOutcome::Deduped);
        assert_eq!(probe.calls, 1);
        assert_eq!(scheduler.recorder().len(), 1);
        assert_eq!(scheduler.smoother().len(), 1);
    }

    #[test]
    fn test_no_face_records_nothing() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![Ok(None), face()]);

        let outcome = scheduler.tick(&frame(0.0), Some(&mut probe), 0.0);
        let report = outcome.report().copied().expect("evaluated frame");
        assert_eq!(report.smoothed_score, None);
        assert_eq!(report.status, AttentionStatus::NoFaceDetected);
        assert_eq!(report.overlay, None);
        assert!(scheduler.recorder().is_empty());

        scheduler.tick(&frame(0.033), Some(&mut probe), 33.0);
        assert_eq!(scheduler.recorder().len(), 1);
    }

    #[test]
    fn test_probe_failure_counts_as_no_face() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![Err(LandmarkError::ProbeFailed {
            reason: "inference error".to_string(),
        })]);

        let outcome = scheduler.tick(&frame(0.0), Some(&mut probe), 0.0);
        assert!(matches!(outcome, TickOutcome::NotDetected(_)));
        assert_eq!(scheduler.stats().invalid, 1);
        assert!(scheduler.recorder().is_empty());
    }

    #[test]
    fn test_malformed_set_counts_as_no_face() {
        let mut scheduler = FrameScheduler::new(8);
        let short = FaceLandmarkSet::new(Vec::new());
        let mut probe = ScriptedProbe::new(vec![Ok(Some(short))]);

        let outcome = scheduler.tick(&frame(0.0), Some(&mut probe), 0.0);
        assert!(matches!(outcome, TickOutcome::NotDetected(_)));
        assert!(scheduler.smoother().is_empty());
    }

    #[test]
    fn test_frame_not_ready_skips_probe() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![face()]);
        let blank = VideoFrame {
            timestamp_secs: 0.0,
            width: 0,
            height: 0,
            sequence: 0,
        };

        assert_eq!(
            scheduler.tick(&blank, Some(&mut probe), 0.0),
            TickOutcome::FrameNotReady
        );
        assert_eq!(scheduler.tick(&frame(0.0), None, 0.0), TickOutcome::FrameNotReady);
        assert_eq!(probe.calls, 0);
        assert_eq!(scheduler.last_timestamp(), None);
    }

    #[test]
    fn test_reset_session_clears_state() {
        let mut scheduler = FrameScheduler::new(8);
        let mut probe = ScriptedProbe::new(vec![face()]);
        scheduler.tick(&frame(0.0), Some(&mut probe), 0.0);

        scheduler.reset_session();
        assert!(scheduler.recorder().is_empty());
        assert!(scheduler.smoother().is_empty());
        assert_eq!(scheduler.stats(), TickStats::default());
        assert_eq!(scheduler.session_average(), None);
    }

    #[test]
    fn test_glancing_away_scenario() {
        let mut scheduler = FrameScheduler::new(8);
        let glance = KeyLandmarks::frontal().with_nose_offset(0.08, 0.0);
        let mut probe = ScriptedProbe::new(vec![Ok(Some(glance.into_landmark_set()))]);

        let outcome = scheduler.tick(&frame(0.0), Some(&mut probe), 0.0);
        let report = outcome.report().copied().expect("evaluated frame");
        assert_eq!(report.smoothed_score, Some(45));
        assert_eq!(report.status, AttentionStatus::GlancingAway);
    }
}
