//! Lifecycle events published by the tracker.

use serde::{Deserialize, Serialize};

use crate::analysis::StatusTone;

/// Event emitted on lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerEvent {
    /// Milliseconds since the tracker was created
    pub timestamp_ms: u64,
    pub kind: TrackerEventKind,
    pub detail: Option<String>,
}

/// Types of lifecycle events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEventKind {
    /// First start: the landmark model is being created
    ModelLoading,
    Started,
    Stopped,
    AcquisitionFailed { reason: String },
}

impl TrackerEventKind {
    /// Status line shown while in the state this event enters.
    pub fn status_message(&self) -> String {
        match self {
            TrackerEventKind::ModelLoading => "Loading attention model...".to_string(),
            TrackerEventKind::Started => "Analyzing...".to_string(),
            TrackerEventKind::Stopped => "Camera idle".to_string(),
            TrackerEventKind::AcquisitionFailed { reason } => {
                format!("Camera unavailable: {}", reason)
            }
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            TrackerEventKind::ModelLoading => StatusTone::Cyan,
            TrackerEventKind::Started => StatusTone::Emerald,
            TrackerEventKind::Stopped => StatusTone::Neutral,
            TrackerEventKind::AcquisitionFailed { .. } => StatusTone::Rose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_messages() {
        assert_eq!(
            TrackerEventKind::ModelLoading.status_message(),
            "Loading attention model..."
        );
        assert_eq!(TrackerEventKind::Stopped.status_message(), "Camera idle");
        let failed = TrackerEventKind::AcquisitionFailed {
            reason: "permission denied".to_string(),
        };
        assert_eq!(failed.status_message(), "Camera unavailable: permission denied");
        assert_eq!(failed.tone(), StatusTone::Rose);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = TrackerEvent {
            timestamp_ms: 5,
            kind: TrackerEventKind::Started,
            detail: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "started");
    }
}
