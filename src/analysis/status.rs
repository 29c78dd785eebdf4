// AttentionStatus - human-readable classification of a smoothed score

use serde::{Deserialize, Serialize};

/// Per-tick attention classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttentionStatus {
    /// Smoothed score >= 65
    Focused,
    /// Smoothed score in [40, 65)
    GlancingAway,
    /// Smoothed score < 40
    LookingAway,
    /// No usable face in the current frame
    NoFaceDetected,
}

/// Colour hint for the status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Emerald,
    Amber,
    Rose,
    Slate,
    Cyan,
    Neutral,
}

impl AttentionStatus {
    pub const FOCUSED_THRESHOLD: u8 = 65;
    pub const GLANCING_THRESHOLD: u8 = 40;

    /// Classify a smoothed score.
    pub fn from_score(smoothed: u8) -> Self {
        if smoothed >= Self::FOCUSED_THRESHOLD {
            AttentionStatus::Focused
        } else if smoothed >= Self::GLANCING_THRESHOLD {
            AttentionStatus::GlancingAway
        } else {
            AttentionStatus::LookingAway
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttentionStatus::Focused => "In focus",
            AttentionStatus::GlancingAway => "Glancing away",
            AttentionStatus::LookingAway => "Looking away",
            AttentionStatus::NoFaceDetected => "No face detected",
        }
    }

    pub fn tone(&self) -> StatusTone {
        match self {
            AttentionStatus::Focused => StatusTone::Emerald,
            AttentionStatus::GlancingAway => StatusTone::Amber,
            AttentionStatus::LookingAway => StatusTone::Rose,
            AttentionStatus::NoFaceDetected => StatusTone::Slate,
        }
    }
}

/// Score text as shown next to the status: `"73%"` or `"--"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDisplay(pub Option<u8>);

impl std::fmt::Display for ScoreDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(score) => write!(f, "{}%", score),
            None => f.write_str("--"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(AttentionStatus::from_score(100), AttentionStatus::Focused);
        assert_eq!(AttentionStatus::from_score(65), AttentionStatus::Focused);
        assert_eq!(AttentionStatus::from_score(64), AttentionStatus::GlancingAway);
        assert_eq!(AttentionStatus::from_score(45), AttentionStatus::GlancingAway);
        assert_eq!(AttentionStatus::from_score(40), AttentionStatus::GlancingAway);
        assert_eq!(AttentionStatus::from_score(39), AttentionStatus::LookingAway);
        assert_eq!(AttentionStatus::from_score(0), AttentionStatus::LookingAway);
    }

    #[test]
    fn test_labels_and_tones() {
        assert_eq!(AttentionStatus::Focused.label(), "In focus");
        assert_eq!(AttentionStatus::NoFaceDetected.label(), "No face detected");
        assert_eq!(AttentionStatus::LookingAway.tone(), StatusTone::Rose);
    }

    #[test]
    fn test_score_display() {
        assert_eq!(ScoreDisplay(Some(73)).to_string(), "73%");
        assert_eq!(ScoreDisplay(None).to_string(), "--");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&AttentionStatus::GlancingAway).unwrap();
        assert_eq!(json, "\"glancing_away\"");
    }
}
