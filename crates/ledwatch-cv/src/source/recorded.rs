use crate::bbox::BBoxCollection;
use crate::traits::Detector;
use crate::Result;
use anyhow::anyhow;

/// A frame whose detector output is already known
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedFrame {
    Detections(BBoxCollection),
    /// The detector failed on this frame.
    Failed(String),
}

/// Plays back the detector output carried by [`RecordedFrame`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordedDetector;

impl Detector<RecordedFrame> for RecordedDetector {
    fn detect(&mut self, frame: &RecordedFrame, confidence: f64) -> Result<BBoxCollection> {
        match frame {
            RecordedFrame::Detections(boxes) => Ok(boxes.clone().filter_by_confidence(confidence)),
            RecordedFrame::Failed(message) => Err(anyhow!("detector failed: {message}")),
        }
    }
}
