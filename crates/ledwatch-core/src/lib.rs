//! Presence stabilization and actuator control
//!
//! A noisy per-frame "target present" signal goes in; debounced
//! activate/deactivate commands for a binary actuator come out.

pub mod actuator;
pub mod config;
pub mod control;
pub mod error;
pub mod fps;
pub mod ring;
pub mod stabilizer;
pub mod threshold;

pub use actuator::{ActuatorLink, Command, LinkConfig, SendOutcome};
pub use config::{CommitPolicy, ControllerConfig, DetectorFailurePolicy};
pub use control::{ActuatorController, ActuatorState, ControlCommand, ControlInput, ControlSession};
pub use error::{CoreError, LinkError};
pub use fps::FpsMeter;
pub use stabilizer::DetectionStabilizer;
pub use threshold::ConfidenceThreshold;
