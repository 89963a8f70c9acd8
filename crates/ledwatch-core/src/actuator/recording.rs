use super::{ActuatorLink, Command, SendOutcome};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::info;

/// In-process link that records commands instead of sending them.
///
/// Clones share the same log, so a clone kept by the caller can inspect what
/// a link moved into a session has sent.
#[derive(Clone, Debug, Default)]
pub struct RecordingLink {
    log: Rc<RefCell<Vec<Command>>>,
    failing: Rc<Cell<bool>>,
}

impl RecordingLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following send report [`SendOutcome::Failed`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn commands(&self) -> Vec<Command> {
        self.log.borrow().clone()
    }

    pub fn count(&self, command: Command) -> usize {
        self.log.borrow().iter().filter(|c| **c == command).count()
    }
}

impl ActuatorLink for RecordingLink {
    fn send(&mut self, command: Command) -> SendOutcome {
        self.log.borrow_mut().push(command);
        if self.failing.get() {
            return SendOutcome::Failed;
        }
        info!(%command, "dry run: command recorded");
        SendOutcome::Unconfirmed
    }
}
