//! Debounces the per-frame "target present" signal.
//!
//! A single frame is a poor witness (motion blur, partial occlusion, lighting
//! flicker on the camera link), so presence is only reported once more than
//! `threshold` of the last `window_size` frames agree.

use crate::config::ControllerConfig;
use crate::ring::DetectionHistory;

#[derive(Debug, Clone)]
pub struct DetectionStabilizer {
    history: DetectionHistory,
    threshold: f64,
}

impl DetectionStabilizer {
    pub fn new(window_size: usize, threshold: f64) -> Self {
        Self {
            history: DetectionHistory::new(window_size),
            threshold,
        }
    }

    pub fn from_config(config: &ControllerConfig) -> Self {
        Self::new(config.window_size, config.stability_threshold)
    }

    /// Record the outcome of one frame.
    pub fn record(&mut self, event: bool) {
        self.history.push(event);
    }

    /// Fraction of windowed frames with a detection; 0.0 for an empty window.
    pub fn stability_ratio(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        self.history.hits() as f64 / self.history.len() as f64
    }

    /// Stable against the configured threshold.
    pub fn is_stable(&self) -> bool {
        self.is_stable_at(self.threshold)
    }

    /// Strictly above `threshold`; a ratio sitting on the threshold is not stable.
    pub fn is_stable_at(&self, threshold: f64) -> bool {
        self.stability_ratio() > threshold
    }

    pub fn history(&self) -> &DetectionHistory {
        &self.history
    }
}

impl Default for DetectionStabilizer {
    fn default() -> Self {
        Self::from_config(&ControllerConfig::default())
    }
}
