//! Frame sources and detectors feeding the presence stabilizer
//!
//! Live capture and YOLO inference need the `opencv` feature; replay and
//! simulated sources are always available.

pub mod bbox;
pub mod detection;
pub mod source;
#[cfg(feature = "opencv")]
pub mod utils;

// Re-export commonly used types
pub use bbox::{BBox, BBoxCollection};
pub use detection::{DetectionConfig, FramePresence};
pub use source::{FrameRead, ReplayControls, ReplayScript, ReplaySource, SimulatedFeed};
pub use traits::{Detector, FrameSource};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use super::*;
    use std::path::Path;
    use std::time::Instant;

    /// Anything that turns a frame into bounding boxes.
    pub trait Detector<F> {
        /// Detect objects in `frame`, dropping boxes scoring under `confidence`.
        fn detect(&mut self, frame: &F, confidence: f64) -> Result<BBoxCollection>;
    }

    /// A stream of frames that may drop out and come back.
    pub trait FrameSource {
        type Frame;

        fn read_frame(&mut self) -> Result<FrameRead<Self::Frame>>;

        /// Try to re-establish a lost stream; `false` once retries are exhausted.
        fn reconnect(&mut self) -> Result<bool>;

        /// Time at which the most recent frame was taken.
        fn frame_time(&self) -> Instant {
            Instant::now()
        }

        /// Write `frame` to `path`; `false` when this source cannot encode frames.
        fn snapshot(&self, _frame: &Self::Frame, _path: &Path) -> Result<bool> {
            Ok(false)
        }
    }
}
