//! Top-level configuration file and command-line overrides

use anyhow::{bail, Context, Result};
use ledwatch_core::{ControllerConfig, LinkConfig};
use ledwatch_cv::detection::DetectionConfig;
use ledwatch_cv::source::{SimulationConfig, StreamConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const MAX_FPS_INTERVAL_SECS: f64 = 3600.0;

/// Everything the watcher needs, as stored in a JSON config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub controller: ControllerConfig,
    pub detection: DetectionConfig,
    pub link: LinkConfig,
    pub stream: StreamConfig,
    pub simulation: SimulationConfig,
    pub runtime: RuntimeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub fps_interval_secs: f64,
    pub snapshot_dir: PathBuf,
    pub debug: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fps_interval_secs: 0.5,
            snapshot_dir: PathBuf::from("."),
            debug: false,
        }
    }
}

impl RuntimeConfig {
    pub fn fps_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.fps_interval_secs).unwrap_or(Duration::from_millis(500))
    }
}

impl WatchConfig {
    /// Read a config file; missing sections fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Swap in named detection and controller presets.
    pub fn with_presets(mut self, detection: Option<&str>, controller: Option<&str>) -> Result<Self> {
        if let Some(name) = detection {
            self.detection = DetectionConfig::preset(name)
                .with_context(|| format!("unknown detection preset '{name}'"))?;
        }
        if let Some(name) = controller {
            self.controller = ControllerConfig::preset(name)
                .with_context(|| format!("unknown controller preset '{name}'"))?;
        }
        Ok(self)
    }

    /// Apply `key.path=value` overrides on top of this config.
    pub fn with_overrides(self, overrides: &[Override]) -> Result<Self> {
        if overrides.is_empty() {
            return Ok(self);
        }

        let mut tree =
            serde_json::to_value(self).context("Failed to serialize config for overrides")?;
        for item in overrides {
            assign(&mut tree, &item.path, parse_value(&item.value))?;
        }
        serde_json::from_value(tree).context("Failed to apply config overrides")
    }

    pub fn validate(&self) -> Result<()> {
        self.controller.validate()?;
        let fps = self.runtime.fps_interval_secs;
        if !(fps > 0.0 && fps <= MAX_FPS_INTERVAL_SECS) {
            bail!("runtime.fps_interval_secs must be in (0, {MAX_FPS_INTERVAL_SECS}], got {fps}");
        }
        self.simulation.validate()?;
        if self.link.port == 0 {
            bail!("link.port must not be 0");
        }
        if self.detection.input_size <= 0 {
            bail!("detection.input_size must be positive");
        }
        Ok(())
    }
}

/// A single `key.path=value` override
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub path: String,
    pub value: String,
}

impl FromStr for Override {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (path, value) = s
            .split_once('=')
            .ok_or_else(|| "override must be in the form key=value".to_string())?;
        if path.trim().is_empty() {
            return Err("override key must not be empty".into());
        }
        Ok(Self {
            path: path.trim().to_string(),
            value: value.trim().to_string(),
        })
    }
}

fn parse_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if trimmed.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(int_val) = trimmed.parse::<i64>() {
        return Value::Number(Number::from(int_val));
    }
    if let Ok(float_val) = trimmed.parse::<f64>() {
        if let Some(number) = Number::from_f64(float_val) {
            return Value::Number(number);
        }
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        if let Ok(json_val) = serde_json::from_str::<Value>(trimmed) {
            return json_val;
        }
    }
    Value::String(trimmed.to_string())
}

fn assign(tree: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let mut target = tree;
    let segments: Vec<&str> = path.split('.').collect();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => bail!("override path must not be empty"),
    };

    for segment in parents {
        if target.is_null() {
            *target = Value::Object(Map::new());
        }
        let Some(object) = target.as_object_mut() else {
            bail!("override path '{path}' descends into a non-object at '{segment}'");
        };
        target = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let Some(object) = target.as_object_mut() else {
        bail!("override path '{path}' descends into a non-object before '{last}'");
    };
    object.insert(last.to_string(), new_value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(path: &str, value: &str) -> Override {
        format!("{path}={value}").parse().unwrap()
    }

    #[test]
    fn overrides_nested_fields() {
        let config = WatchConfig::default()
            .with_overrides(&[
                set("link.host", "10.0.0.7"),
                set("controller.window_size", "15"),
                set("detection.confidence", "0.35"),
                set("controller.commit_policy", "strict"),
            ])
            .unwrap();

        assert_eq!(config.link.host, "10.0.0.7");
        assert_eq!(config.controller.window_size, 15);
        assert_eq!(config.detection.confidence.value(), 0.35);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_malformed_overrides() {
        assert!("no-equals".parse::<Override>().is_err());
        assert!("=1".parse::<Override>().is_err());

        let err = WatchConfig::default()
            .with_overrides(&[set("link.port.number", "1")])
            .unwrap_err();
        assert!(err.to_string().contains("non-object"));

        let err = WatchConfig::default()
            .with_overrides(&[set("controller.window_size.inner.deep", "1")])
            .unwrap_err();
        assert!(err.to_string().contains("non-object at 'inner'"));

        assert!(WatchConfig::default()
            .with_overrides(&[set("link.port", "\"eighty\"")])
            .is_err());
    }

    #[test]
    fn validate_catches_bad_runtime() {
        let mut config = WatchConfig::default();
        config.runtime.fps_interval_secs = 0.0;
        assert!(config.validate().is_err());

        config.runtime.fps_interval_secs = 1e300;
        assert!(config.validate().is_err());
    }

    #[test]
    fn oversized_values_fail_validation() {
        let config = WatchConfig::default()
            .with_overrides(&[set("controller.activation_cooldown_secs", "1e20")])
            .unwrap();
        assert!(config.validate().is_err());

        let config = WatchConfig::default()
            .with_overrides(&[set("simulation.fps", "1e-300")])
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn presets_replace_sections() {
        let config = WatchConfig::default()
            .with_presets(Some("lavender_disease"), Some("strict"))
            .unwrap()
            .with_overrides(&[set("detection.confidence", "0.4")])
            .unwrap();
        assert_eq!(config.detection.target_class, 0);
        assert_eq!(config.detection.confidence.value(), 0.4);
        assert_eq!(config.controller.commit_policy, ledwatch_core::CommitPolicy::Strict);

        assert!(WatchConfig::default().with_presets(Some("cat"), None).is_err());
        assert!(WatchConfig::default().with_presets(None, Some("eager")).is_err());
    }

    #[test]
    fn loads_partial_file() {
        let path = std::env::temp_dir().join(format!("ledwatch-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "link": { "port": 9000 }, "controller": { "window_size": 4 } }"#)
            .unwrap();
        let config = WatchConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.link.port, 9000);
        assert_eq!(config.link.activate_command, "LED_ON");
        assert_eq!(config.controller.window_size, 4);
    }
}
