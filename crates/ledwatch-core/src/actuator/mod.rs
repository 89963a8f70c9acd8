//! Actuator commands and transports
//!
//! Commands are fire-and-forget: no transport in this crate waits for an
//! acknowledgement, so a successful send only ever means "left this host".

pub mod recording;
pub mod udp;

pub use recording::RecordingLink;
pub use udp::UdpLink;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

/// Commands understood by the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Activate,
    Deactivate,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Activate => f.write_str("activate"),
            Command::Deactivate => f.write_str("deactivate"),
        }
    }
}

/// What the transport knows about a sent command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// The actuator acknowledged the command.
    Confirmed,
    /// The command left this host; delivery is unknown.
    Unconfirmed,
    /// The transport rejected the command.
    Failed,
}

impl SendOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SendOutcome::Failed)
    }
}

/// A transport able to carry actuator commands.
pub trait ActuatorLink {
    fn send(&mut self, command: Command) -> SendOutcome;
}

impl<L: ActuatorLink + ?Sized> ActuatorLink for Box<L> {
    fn send(&mut self, command: Command) -> SendOutcome {
        (**self).send(command)
    }
}

/// Network endpoint and wire literals for the actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub host: String,
    pub port: u16,
    pub timeout_ms: u64,
    pub activate_command: String,
    pub deactivate_command: String,
    pub test_on_startup: bool,
    pub test_pause_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.196".to_string(),
            port: 82,
            timeout_ms: 100,
            activate_command: "LED_ON".to_string(),
            deactivate_command: "LED_OFF".to_string(),
            test_on_startup: true,
            test_pause_ms: 1000,
        }
    }
}

impl LinkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn test_pause(&self) -> Duration {
        Duration::from_millis(self.test_pause_ms)
    }

    /// Wire literal for a command
    pub fn literal(&self, command: Command) -> &str {
        match command {
            Command::Activate => &self.activate_command,
            Command::Deactivate => &self.deactivate_command,
        }
    }
}

/// Switch the actuator on, wait `pause`, and switch it off again.
///
/// Returns `true` when neither send was rejected. The off command is not sent
/// when the on command fails.
pub fn probe_link<L: ActuatorLink + ?Sized>(link: &mut L, pause: Duration) -> bool {
    info!("testing actuator link");

    if link.send(Command::Activate).is_failed() {
        warn!("actuator link test failed: activate rejected");
        return false;
    }
    if !pause.is_zero() {
        std::thread::sleep(pause);
    }
    if link.send(Command::Deactivate).is_failed() {
        warn!("actuator link test failed: deactivate rejected");
        return false;
    }

    info!("actuator link working");
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_sends_on_then_off() {
        let mut link = RecordingLink::new();
        assert!(probe_link(&mut link, Duration::ZERO));
        assert_eq!(link.commands(), vec![Command::Activate, Command::Deactivate]);
    }

    #[test]
    fn probe_stops_after_failed_activate() {
        let mut link = RecordingLink::new();
        link.set_failing(true);
        assert!(!probe_link(&mut link, Duration::ZERO));
        assert_eq!(link.commands(), vec![Command::Activate]);
    }

    #[test]
    fn literals_follow_config() {
        let config = LinkConfig::default();
        assert_eq!(config.literal(Command::Activate), "LED_ON");
        assert_eq!(config.literal(Command::Deactivate), "LED_OFF");
        assert_eq!(config.timeout(), Duration::from_millis(100));
    }
}
