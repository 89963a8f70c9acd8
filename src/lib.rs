//! Camera-driven actuator control: detections in, debounced LED commands out.

pub mod config;
pub mod controls;
pub mod pipeline;

pub use config::{Override, WatchConfig};
pub use pipeline::{ExitReason, Pipeline, PipelineSettings, RunSummary};
