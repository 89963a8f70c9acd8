//! Actuator hysteresis control and manual overrides

pub mod command;
pub mod controller;
pub mod session;
pub mod state;

pub use command::{ControlCommand, ControlInput, NoControls, QueuedControls};
pub use controller::{ActuatorController, Decision, Switch};
pub use session::ControlSession;
pub use state::ActuatorState;
