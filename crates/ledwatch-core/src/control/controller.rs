use super::state::ActuatorState;
use crate::actuator::{ActuatorLink, Command, SendOutcome};
use crate::config::{CommitPolicy, ControllerConfig};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// What the hysteresis rules ask for on one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The signal agrees with the current state.
    Hold,
    /// A switch is due.
    Send(Command),
    /// A switch is wanted but its cooldown has not elapsed.
    Suppressed(Command),
}

/// A command that was actually sent, with what came of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Switch {
    pub command: Command,
    pub outcome: SendOutcome,
    /// Whether the in-memory state now reflects the command.
    pub committed: bool,
}

/// Two-state hysteresis controller with separate on/off cooldowns.
///
/// Both cooldowns are measured from the last committed activation or manual
/// override; automatic deactivation does not restart the clock.
#[derive(Debug, Clone)]
pub struct ActuatorController {
    state: ActuatorState,
    last_transition: Option<Instant>,
    activation_cooldown: Duration,
    deactivation_cooldown: Duration,
    commit_policy: CommitPolicy,
    enabled: bool,
    activations: u64,
    deactivations: u64,
}

impl ActuatorController {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            state: ActuatorState::Off,
            last_transition: None,
            activation_cooldown: config.activation_cooldown(),
            deactivation_cooldown: config.deactivation_cooldown(),
            commit_policy: config.commit_policy,
            enabled: true,
            activations: 0,
            deactivations: 0,
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    pub fn last_transition(&self) -> Option<Instant> {
        self.last_transition
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stop issuing commands; used when the link test fails at startup.
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn activations(&self) -> u64 {
        self.activations
    }

    pub fn deactivations(&self) -> u64 {
        self.deactivations
    }

    fn cooled_down(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_transition {
            Some(at) => now.saturating_duration_since(at) > cooldown,
            None => true,
        }
    }

    /// Apply the transition table without side effects.
    pub fn decide(&self, stable: bool, now: Instant) -> Decision {
        match (self.state, stable) {
            (ActuatorState::Off, true) => {
                if self.cooled_down(now, self.activation_cooldown) {
                    Decision::Send(Command::Activate)
                } else {
                    Decision::Suppressed(Command::Activate)
                }
            }
            (ActuatorState::On, false) => {
                if self.cooled_down(now, self.deactivation_cooldown) {
                    Decision::Send(Command::Deactivate)
                } else {
                    Decision::Suppressed(Command::Deactivate)
                }
            }
            _ => Decision::Hold,
        }
    }

    /// Run one frame of automatic control.
    pub fn evaluate<L: ActuatorLink + ?Sized>(
        &mut self,
        stable: bool,
        now: Instant,
        link: &mut L,
    ) -> Option<Switch> {
        if !self.enabled {
            return None;
        }

        match self.decide(stable, now) {
            Decision::Hold => None,
            Decision::Suppressed(command) => {
                debug!(%command, "suppressed by cooldown");
                None
            }
            Decision::Send(command) => {
                match command {
                    Command::Activate => info!("target stable, turning actuator ON"),
                    Command::Deactivate => info!("target gone, turning actuator OFF"),
                }
                let switch = self.apply(command, link);
                if switch.committed && command == Command::Activate {
                    self.last_transition = Some(now);
                }
                Some(switch)
            }
        }
    }

    /// Flip the actuator regardless of stability and cooldowns.
    pub fn toggle<L: ActuatorLink + ?Sized>(&mut self, now: Instant, link: &mut L) -> Option<Switch> {
        if !self.enabled {
            warn!("actuator control is disabled");
            return None;
        }

        let command = self.state.toggle_command();
        info!(%command, "manual override");
        let switch = self.apply(command, link);
        if switch.committed {
            self.last_transition = Some(now);
        }
        Some(switch)
    }

    /// Force the actuator OFF if this controller left it ON.
    pub fn shutdown<L: ActuatorLink + ?Sized>(&mut self, link: &mut L) -> Option<SendOutcome> {
        if !self.enabled || !self.state.is_on() {
            return None;
        }

        info!("turning actuator OFF for shutdown");
        let outcome = link.send(Command::Deactivate);
        if outcome.is_failed() {
            warn!("shutdown deactivate was rejected; actuator may still be ON");
        }
        self.state = ActuatorState::Off;
        self.deactivations += 1;
        Some(outcome)
    }

    fn apply<L: ActuatorLink + ?Sized>(&mut self, command: Command, link: &mut L) -> Switch {
        let outcome = link.send(command);
        let committed = match self.commit_policy {
            CommitPolicy::Optimistic => true,
            CommitPolicy::Strict => !outcome.is_failed(),
        };

        if outcome.is_failed() {
            warn!(%command, committed, "actuator command failed");
        }

        if committed {
            self.state = ActuatorState::after(command);
            match command {
                Command::Activate => self.activations += 1,
                Command::Deactivate => self.deactivations += 1,
            }
        }

        Switch {
            command,
            outcome,
            committed,
        }
    }
}

impl Default for ActuatorController {
    fn default() -> Self {
        Self::new(&ControllerConfig::default())
    }
}
