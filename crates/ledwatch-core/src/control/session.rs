use super::controller::{ActuatorController, Switch};
use super::state::ActuatorState;
use crate::actuator::{probe_link, ActuatorLink, SendOutcome};
use std::time::{Duration, Instant};

/// Owns a controller together with its link and guarantees teardown.
///
/// Dropping the session, on any exit path, turns the actuator OFF if the
/// controller left it ON. An explicit [`ControlSession::shutdown`] does the
/// same and makes the drop a no-op.
pub struct ControlSession<L: ActuatorLink> {
    controller: ActuatorController,
    link: L,
}

impl<L: ActuatorLink> ControlSession<L> {
    pub fn new(controller: ActuatorController, link: L) -> Self {
        Self { controller, link }
    }

    pub fn controller(&self) -> &ActuatorController {
        &self.controller
    }

    pub fn state(&self) -> ActuatorState {
        self.controller.state()
    }

    /// Disable the controller unless the link test passes.
    pub fn verify_link(&mut self, pause: Duration) -> bool {
        let ok = probe_link(&mut self.link, pause);
        if !ok {
            self.controller.disable();
        }
        ok
    }

    pub fn evaluate(&mut self, stable: bool, now: Instant) -> Option<Switch> {
        self.controller.evaluate(stable, now, &mut self.link)
    }

    pub fn toggle(&mut self, now: Instant) -> Option<Switch> {
        self.controller.toggle(now, &mut self.link)
    }

    /// Run the on/off link test without touching controller state.
    pub fn probe(&mut self, pause: Duration) -> bool {
        probe_link(&mut self.link, pause)
    }

    pub fn shutdown(&mut self) -> Option<SendOutcome> {
        self.controller.shutdown(&mut self.link)
    }
}

impl<L: ActuatorLink> Drop for ControlSession<L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::{Command, RecordingLink};

    #[test]
    fn drop_turns_actuator_off_once() {
        let log = RecordingLink::new();
        {
            let mut session = ControlSession::new(ActuatorController::default(), log.clone());
            session.evaluate(true, Instant::now());
            assert_eq!(session.state(), ActuatorState::On);
        }
        assert_eq!(log.commands(), vec![Command::Activate, Command::Deactivate]);
    }

    #[test]
    fn explicit_shutdown_then_drop_sends_once() {
        let log = RecordingLink::new();
        let mut session = ControlSession::new(ActuatorController::default(), log.clone());
        session.evaluate(true, Instant::now());
        assert!(session.shutdown().is_some());
        drop(session);
        assert_eq!(log.count(Command::Deactivate), 1);
    }

    #[test]
    fn failed_link_test_disables_control() {
        let log = RecordingLink::new();
        log.set_failing(true);
        let mut session = ControlSession::new(ActuatorController::default(), log.clone());

        assert!(!session.verify_link(Duration::ZERO));
        log.set_failing(false);
        assert_eq!(session.evaluate(true, Instant::now()), None);
        assert_eq!(log.commands(), vec![Command::Activate]);
    }

    #[test]
    fn teardown_runs_during_unwind() {
        let log = RecordingLink::new();
        let inner = log.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let mut session = ControlSession::new(ActuatorController::default(), inner);
            session.evaluate(true, Instant::now());
            panic!("frame loop blew up");
        }));
        assert!(result.is_err());
        assert_eq!(log.count(Command::Deactivate), 1);
    }
}
