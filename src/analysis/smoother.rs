// ScoreSmoother - rolling mean over the most recent instantaneous scores
//
// Plain running average with FIFO eviction. No exponential decay and no
// outlier rejection: a single bad frame moves the output by at most 1/N.

use std::collections::VecDeque;

/// Default number of scores in the smoothing window
pub const DEFAULT_HISTORY_CAPACITY: usize = 8;

/// Bounded FIFO of instantaneous scores.
#[derive(Debug, Clone)]
pub struct ScoreSmoother {
    history: VecDeque<u8>,
    capacity: usize,
}

impl ScoreSmoother {
    /// Create a smoother holding at most `capacity` scores (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a score and return the rounded mean of the window.
    ///
    /// # Arguments
    /// * `score` - Instantaneous score in [0, 100]
    ///
    /// # Returns
    /// Smoothed score in [0, 100]
    pub fn push(&mut self, score: u8) -> u8 {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(score);

        let sum: u32 = self.history.iter().map(|&s| s as u32).sum();
        (sum as f64 / self.history.len() as f64).round() as u8
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Scores currently in the window, oldest first.
    pub fn window(&self) -> impl Iterator<Item = u8> + '_ {
        self.history.iter().copied()
    }
}

impl Default for ScoreSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_converges() {
        let mut smoother = ScoreSmoother::default();
        smoother.push(10);
        let mut last = 0;
        for _ in 0..8 {
            last = smoother.push(73);
        }
        assert_eq!(last, 73);
    }

    #[test]
    fn test_ninth_push_evicts_oldest() {
        let mut smoother = ScoreSmoother::default();
        smoother.push(0);
        for _ in 0..7 {
            smoother.push(80);
        }
        assert_eq!(smoother.len(), 8);
        assert_eq!(smoother.window().next(), Some(0));

        let smoothed = smoother.push(80);
        assert_eq!(smoother.len(), 8);
        assert_eq!(smoothed, 80);
        assert!(smoother.window().all(|s| s == 80));
    }

    #[test]
    fn test_running_mean_rounds() {
        let mut smoother = ScoreSmoother::default();
        assert_eq!(smoother.push(100), 100);
        assert_eq!(smoother.push(45), 73); // 72.5 rounds up
        assert_eq!(smoother.push(0), 48); // 48.33
    }

    #[test]
    fn test_reset_clears_window() {
        let mut smoother = ScoreSmoother::default();
        smoother.push(50);
        smoother.push(60);
        smoother.reset();
        assert!(smoother.is_empty());
        assert_eq!(smoother.push(10), 10);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut smoother = ScoreSmoother::new(0);
        assert_eq!(smoother.capacity(), 1);
        smoother.push(10);
        assert_eq!(smoother.push(90), 90);
    }
}
