//! Controller configuration

use crate::error::{invalid, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the controller commits a state change after sending a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Assume every command took effect, whatever the transport reported.
    #[default]
    Optimistic,
    /// Keep the previous state when the transport reports a failure.
    Strict,
}

/// What a failed detector invocation means for the rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorFailurePolicy {
    /// Drop the frame; the window is left untouched.
    #[default]
    Skip,
    /// Record the frame as "target absent".
    TreatAsAbsent,
}

/// Upper bound for either cooldown: one day.
pub const MAX_COOLDOWN_SECS: f64 = 86_400.0;

/// Stabilizer and hysteresis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub window_size: usize,
    pub stability_threshold: f64,
    pub activation_cooldown_secs: f64,
    pub deactivation_cooldown_secs: f64,
    pub commit_policy: CommitPolicy,
    pub detector_failure_policy: DetectorFailurePolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            stability_threshold: 0.3,
            activation_cooldown_secs: 1.0,
            deactivation_cooldown_secs: 2.0,
            commit_policy: CommitPolicy::Optimistic,
            detector_failure_policy: DetectorFailurePolicy::Skip,
        }
    }
}

impl ControllerConfig {
    /// Only state changes the transport did not reject are committed
    pub fn strict() -> Self {
        Self {
            commit_policy: CommitPolicy::Strict,
            ..Default::default()
        }
    }

    /// Longer window and higher bar, for flickery links
    pub fn conservative() -> Self {
        Self {
            window_size: 20,
            stability_threshold: 0.5,
            deactivation_cooldown_secs: 4.0,
            ..Default::default()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "strict" => Some(Self::strict()),
            "conservative" => Some(Self::conservative()),
            _ => None,
        }
    }

    /// Out-of-range values (only possible before `validate`) never expire.
    pub fn activation_cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.activation_cooldown_secs).unwrap_or(Duration::MAX)
    }

    pub fn deactivation_cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.deactivation_cooldown_secs).unwrap_or(Duration::MAX)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(invalid("window_size must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.stability_threshold) {
            return Err(invalid(format!(
                "stability_threshold must be in [0, 1), got {}",
                self.stability_threshold
            )));
        }
        for (name, secs) in [
            ("activation_cooldown_secs", self.activation_cooldown_secs),
            ("deactivation_cooldown_secs", self.deactivation_cooldown_secs),
        ] {
            if !(0.0..=MAX_COOLDOWN_SECS).contains(&secs) {
                return Err(invalid(format!(
                    "{name} must be between 0 and {MAX_COOLDOWN_SECS} seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_tuning() {
        let config = ControllerConfig::default();
        assert_eq!(config.window_size, 10);
        assert_eq!(config.activation_cooldown(), Duration::from_secs(1));
        assert_eq!(config.deactivation_cooldown(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = ControllerConfig::default();
        config.window_size = 0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.stability_threshold = 1.0;
        assert!(config.validate().is_err());

        let mut config = ControllerConfig::default();
        config.deactivation_cooldown_secs = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn huge_cooldowns_are_rejected_not_panicking() {
        let mut config = ControllerConfig::default();
        config.activation_cooldown_secs = 1e20;
        assert!(config.validate().is_err());
        assert_eq!(config.activation_cooldown(), Duration::MAX);

        config.activation_cooldown_secs = MAX_COOLDOWN_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(ControllerConfig::preset("strict").unwrap().commit_policy, CommitPolicy::Strict);
        assert_eq!(ControllerConfig::preset("conservative").unwrap().window_size, 20);
        assert!(ControllerConfig::preset("eager").is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{ "window_size": 5, "commit_policy": "strict" }"#).unwrap();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.commit_policy, CommitPolicy::Strict);
        assert_eq!(config.stability_threshold, 0.3);
    }
}
