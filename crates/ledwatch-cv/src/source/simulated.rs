//! Seeded random feed for exercising the controller without a camera
//!
//! The target alternates between present and absent phases. While present
//! it is detected with probability `hit_rate`; while absent a false positive
//! shows up with probability `false_positive_rate`.

use super::recorded::RecordedFrame;
use super::FrameRead;
use crate::bbox::{BBox, BBoxCollection};
use crate::traits::FrameSource;
use crate::Result;
use anyhow::bail;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub frames: u64,
    pub fps: f64,
    pub phase_frames: u64,
    pub hit_rate: f64,
    pub false_positive_rate: f64,
    pub failure_rate: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            fps: 15.0,
            phase_frames: 90,
            hit_rate: 0.7,
            false_positive_rate: 0.1,
            failure_rate: 0.0,
            seed: 7,
        }
    }
}

impl SimulationConfig {
    pub const MIN_FPS: f64 = 0.001;
    pub const MAX_FPS: f64 = 1000.0;

    pub fn validate(&self) -> Result<()> {
        if !(Self::MIN_FPS..=Self::MAX_FPS).contains(&self.fps) {
            bail!(
                "simulation.fps must be between {} and {}, got {}",
                Self::MIN_FPS,
                Self::MAX_FPS,
                self.fps
            );
        }
        Ok(())
    }
}

pub struct SimulatedFeed {
    config: SimulationConfig,
    target_class: u32,
    rng: StdRng,
    start: Instant,
    clock: Instant,
    index: u64,
}

impl SimulatedFeed {
    pub fn new(config: SimulationConfig, target_class: u32, start: Instant) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            target_class,
            rng,
            start,
            clock: start,
            index: 0,
        }
    }

    fn frame_interval(&self) -> Duration {
        if self.config.fps > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.config.fps).unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    /// Virtual time of frame `index`; held at the last good value on overflow.
    fn advance_clock(&mut self, index: u64) {
        let frames = u32::try_from(index).unwrap_or(u32::MAX);
        if let Some(now) = self
            .frame_interval()
            .checked_mul(frames)
            .and_then(|offset| self.start.checked_add(offset))
        {
            self.clock = now;
        }
    }

    /// Whether the target is actually in view for frame `index`
    pub fn target_in_view(&self, index: u64) -> bool {
        let phase = self.config.phase_frames.max(1);
        (index / phase) % 2 == 1
    }

    fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.rng.gen_bool(p)
    }

    fn synth_box(&mut self) -> BBox {
        let x = self.rng.gen_range(0..280);
        let y = self.rng.gen_range(0..200);
        let confidence = self.rng.gen_range(0.25..0.95);
        BBox::new(x, y, 40, 40, confidence).with_class(self.target_class, "target")
    }
}

impl FrameSource for SimulatedFeed {
    type Frame = RecordedFrame;

    fn read_frame(&mut self) -> Result<FrameRead<RecordedFrame>> {
        if self.index >= self.config.frames {
            return Ok(FrameRead::Finished);
        }
        let index = self.index;
        self.index += 1;
        self.advance_clock(index);

        if self.chance(self.config.failure_rate) {
            return Ok(FrameRead::Frame(RecordedFrame::Failed(format!(
                "simulated failure on frame {index}"
            ))));
        }

        let rate = if self.target_in_view(index) {
            self.config.hit_rate
        } else {
            self.config.false_positive_rate
        };

        let mut boxes = BBoxCollection::new();
        if self.chance(rate) {
            boxes.push(self.synth_box());
        }
        Ok(FrameRead::Frame(RecordedFrame::Detections(boxes)))
    }

    fn reconnect(&mut self) -> Result<bool> {
        Ok(true)
    }

    fn frame_time(&self) -> Instant {
        self.clock
    }
}
