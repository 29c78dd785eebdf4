// SessionRecorder - every smoothed score since the last start

use crate::geometry::rounded_mean;

/// Unbounded accumulator of smoothed scores for the current run.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    samples: Vec<u8>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, score: u8) {
        self.samples.push(score);
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Rounded mean of all recorded scores, `None` before the first sample.
    pub fn average(&self) -> Option<u8> {
        rounded_mean(self.samples.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }
}
