use crate::actuator::Command;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorState {
    On,
    #[default]
    Off,
}

impl ActuatorState {
    pub fn is_on(&self) -> bool {
        matches!(self, ActuatorState::On)
    }

    /// Command that moves the actuator out of this state
    pub fn toggle_command(&self) -> Command {
        match self {
            ActuatorState::On => Command::Deactivate,
            ActuatorState::Off => Command::Activate,
        }
    }

    /// State reached once `command` has taken effect
    pub fn after(command: Command) -> Self {
        match command {
            Command::Activate => ActuatorState::On,
            Command::Deactivate => ActuatorState::Off,
        }
    }
}

impl fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActuatorState::On => f.write_str("ON"),
            ActuatorState::Off => f.write_str("OFF"),
        }
    }
}
