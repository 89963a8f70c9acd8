//! Reduces a frame's detections to the single presence bit the core consumes

use crate::bbox::BBoxCollection;
use serde::Serialize;

/// Target presence in one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FramePresence {
    pub targets: usize,
}

impl FramePresence {
    /// Count `target_class` boxes at or above `confidence`.
    pub fn assess(detections: &BBoxCollection, target_class: u32, confidence: f64) -> Self {
        Self {
            targets: detections.count_confident(target_class, confidence),
        }
    }

    pub fn is_present(&self) -> bool {
        self.targets > 0
    }
}
