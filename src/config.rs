//! Configuration management for the attention tracker
//!
//! This module provides runtime configuration loading from JSON files so
//! camera constraints, model options and loop pacing can be adjusted without
//! recompilation. The scoring constants themselves are fixed in
//! [`crate::analysis::AttentionEstimator`] and are not configurable.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::analysis::DEFAULT_HISTORY_CAPACITY;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Rolling-average parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Number of instantaneous scores averaged into the smoothed score
    pub history_capacity: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Constraints passed to the camera backend when opening a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Preferred frame width in pixels
    pub ideal_width: u32,
    /// Preferred frame height in pixels
    pub ideal_height: u32,
    /// "user" for the front-facing camera, "environment" for the rear one
    pub facing_mode: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            ideal_width: 640,
            ideal_height: 360,
            facing_mode: "user".to_string(),
        }
    }
}

/// Landmark model options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Location of the face landmarker model asset
    pub model_asset_path: String,
    /// Maximum faces the detector reports; only the first is scored
    pub num_faces: u32,
    /// Detector running mode; the engine feeds video frames with timestamps
    pub running_mode: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_asset_path: "https://storage.googleapis.com/mediapipe-models/face_landmarker/face_landmarker/float16/1/face_landmarker.task".to_string(),
            num_faces: 1,
            running_mode: "VIDEO".to_string(),
        }
    }
}

/// Frame loop pacing and event channel sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Display refresh rate emulated by the interval frame clock
    pub frame_rate_hz: u32,
    /// Buffer size of the tick and lifecycle broadcast channels
    pub event_buffer: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            frame_rate_hz: 30,
            event_buffer: 128,
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// Loaded configuration; if the file doesn't exist or the JSON is
    /// invalid, the default config with a warning logged
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default asset location
    pub fn load() -> Self {
        Self::load_from_file("assets/attention_config.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.smoothing.history_capacity, 8);
        assert_eq!(config.camera.ideal_width, 640);
        assert_eq!(config.camera.ideal_height, 360);
        assert_eq!(config.camera.facing_mode, "user");
        assert_eq!(config.model.num_faces, 1);
        assert_eq!(config.scheduler.frame_rate_hz, 30);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"smoothing":{"history_capacity":4}}"#).unwrap();
        assert_eq!(parsed.smoothing.history_capacity, 4);
        assert_eq!(parsed.camera, CameraConfig::default());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_from_file("does/not/exist.json");
        assert_eq!(config.smoothing.history_capacity, 8);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(
            parsed.scheduler.event_buffer,
            config.scheduler.event_buffer
        );
    }
}
