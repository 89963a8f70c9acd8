//! Frame sources: live stream, scripted replay and random simulation

pub mod recorded;
pub mod replay;
pub mod simulated;
#[cfg(feature = "opencv")]
pub mod stream;

pub use recorded::{RecordedDetector, RecordedFrame};
pub use replay::{ReplayControls, ReplayError, ReplayEvent, ReplayScript, ReplaySource};
pub use simulated::{SimulatedFeed, SimulationConfig};
#[cfg(feature = "opencv")]
pub use stream::StreamCapture;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of pulling one frame
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRead<F> {
    Frame(F),
    /// The stream dropped; the caller should try to reconnect.
    Lost,
    /// The source has no more frames.
    Finished,
}

/// Camera stream location and reconnect policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub url: String,
    pub connect_attempts: u32,
    pub retry_delay_ms: u64,
    /// Wait after opening the stream before probing it.
    pub settle_delay_ms: u64,
    pub probe_reads: u32,
    pub probe_delay_ms: u64,
    /// Wait after losing the stream before the first reconnect attempt.
    pub lost_pause_ms: u64,
    pub frame_width: i32,
    pub frame_height: i32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.0.196:81/stream".to_string(),
            connect_attempts: 5,
            retry_delay_ms: 2000,
            settle_delay_ms: 2000,
            probe_reads: 3,
            probe_delay_ms: 100,
            lost_pause_ms: 1000,
            frame_width: 320,
            frame_height: 240,
        }
    }
}

impl StreamConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn lost_pause(&self) -> Duration {
        Duration::from_millis(self.lost_pause_ms)
    }
}
