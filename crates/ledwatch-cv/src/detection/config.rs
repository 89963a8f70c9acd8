//! Detection configuration

use ledwatch_core::ConfidenceThreshold;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Detector model and target selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Weights file (ONNX, or Darknet weights when `model_config` is set).
    pub model_path: PathBuf,
    /// Darknet network description, if the model needs one.
    pub model_config: Option<PathBuf>,
    pub target_class: u32,
    pub class_names: BTreeMap<u32, String>,
    /// Initial cut-off; rounded to hundredths and clamped to [0.05, 0.95].
    pub confidence: ConfidenceThreshold,
    pub nms_threshold: f64,
    pub input_size: i32,
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::hat()
    }
}

impl DetectionConfig {
    /// Hat detector driving the LED
    pub fn hat() -> Self {
        Self {
            model_path: "best.onnx".into(),
            model_config: None,
            target_class: 2,
            class_names: BTreeMap::from([(2, "hat".to_string())]),
            confidence: ConfidenceThreshold::new(0.20),
            nms_threshold: 0.45,
            input_size: 320,
            max_detections: 10,
        }
    }

    /// Lavender disease detector; the diseased class is the target
    pub fn lavender_disease() -> Self {
        Self {
            model_path: "lavender.onnx".into(),
            target_class: 0,
            class_names: BTreeMap::from([
                (0, "Lavender_Disease".to_string()),
                (1, "Lavender_Healthy".to_string()),
            ]),
            confidence: ConfidenceThreshold::new(0.25),
            input_size: 640,
            ..Self::hat()
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "hat" => Some(Self::hat()),
            "lavender_disease" => Some(Self::lavender_disease()),
            _ => None,
        }
    }

    /// Display name for a class id
    pub fn class_name(&self, class_id: u32) -> &str {
        self.class_names
            .get(&class_id)
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    pub fn target_name(&self) -> &str {
        self.class_name(self.target_class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let hat = DetectionConfig::hat();
        assert_eq!(hat.target_name(), "hat");
        assert_eq!(hat.confidence.value(), 0.20);

        let lavender = DetectionConfig::lavender_disease();
        assert_eq!(lavender.target_name(), "Lavender_Disease");
        assert_eq!(lavender.class_name(7), "unknown");
        assert_eq!(lavender.max_detections, 10);

        assert_eq!(DetectionConfig::preset("lavender_disease"), Some(lavender));
        assert!(DetectionConfig::preset("cat").is_none());
    }

    #[test]
    fn json_round_trips_class_map() {
        let json = serde_json::to_string(&DetectionConfig::lavender_disease()).unwrap();
        let back: DetectionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DetectionConfig::lavender_disease());
    }
}
