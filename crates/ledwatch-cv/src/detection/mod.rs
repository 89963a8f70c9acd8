//! Detector configuration, presence reduction and the YOLO backend

pub mod config;
pub mod decode;
pub mod presence;
#[cfg(feature = "opencv")]
pub mod yolo;

pub use config::DetectionConfig;
pub use decode::{OutputLayout, RawOutput};
pub use presence::FramePresence;
#[cfg(feature = "opencv")]
pub use yolo::YoloDetector;
