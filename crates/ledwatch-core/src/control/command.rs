use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Operator commands coming from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlCommand {
    Quit,
    ToggleActuator,
    TestLink,
    ToggleDebug,
    RaiseConfidence,
    LowerConfidence,
    Snapshot,
}

impl ControlCommand {
    /// Keyboard binding, case-insensitive
    pub fn from_key(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            'q' => Some(Self::Quit),
            'l' => Some(Self::ToggleActuator),
            't' => Some(Self::TestLink),
            'd' => Some(Self::ToggleDebug),
            '+' | '=' => Some(Self::RaiseConfidence),
            '-' | '_' => Some(Self::LowerConfidence),
            's' => Some(Self::Snapshot),
            _ => None,
        }
    }
}

/// Non-blocking source of operator commands, polled once per frame.
pub trait ControlInput {
    fn poll(&mut self) -> Option<ControlCommand>;
}

/// Input layer with no operator attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoControls;

impl ControlInput for NoControls {
    fn poll(&mut self) -> Option<ControlCommand> {
        None
    }
}

/// Pre-scripted commands, handed out one per poll.
#[derive(Debug, Default, Clone)]
pub struct QueuedControls {
    queue: VecDeque<ControlCommand>,
}

impl QueuedControls {
    pub fn new<I: IntoIterator<Item = ControlCommand>>(commands: I) -> Self {
        Self {
            queue: commands.into_iter().collect(),
        }
    }
}

impl ControlInput for QueuedControls {
    fn poll(&mut self) -> Option<ControlCommand> {
        self.queue.pop_front()
    }
}

impl<C: ControlInput + ?Sized> ControlInput for Box<C> {
    fn poll(&mut self) -> Option<ControlCommand> {
        (**self).poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bindings() {
        assert_eq!(ControlCommand::from_key('Q'), Some(ControlCommand::Quit));
        assert_eq!(ControlCommand::from_key('='), Some(ControlCommand::RaiseConfidence));
        assert_eq!(ControlCommand::from_key('_'), Some(ControlCommand::LowerConfidence));
        assert_eq!(ControlCommand::from_key('x'), None);
    }

    #[test]
    fn queue_drains_in_order() {
        let mut controls =
            QueuedControls::new([ControlCommand::ToggleDebug, ControlCommand::Quit]);
        assert_eq!(controls.poll(), Some(ControlCommand::ToggleDebug));
        assert_eq!(controls.poll(), Some(ControlCommand::Quit));
        assert_eq!(controls.poll(), None);
    }
}
