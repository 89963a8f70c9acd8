use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const STEP: u32 = 5;
const MIN: u32 = 5;
const MAX: u32 = 95;

/// Detector confidence cut-off, adjustable in 0.05 steps within [0.05, 0.95].
///
/// Held in hundredths so repeated steps do not accumulate float error.
/// Values are rounded to the nearest hundredth and clamped on construction,
/// so a configured `0.123` becomes `0.12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct ConfidenceThreshold(u32);

impl ConfidenceThreshold {
    pub fn new(value: f64) -> Self {
        let hundredths = if value.is_finite() {
            (value * 100.0).round().clamp(MIN as f64, MAX as f64) as u32
        } else {
            MIN
        };
        let threshold = Self(hundredths);
        if (threshold.value() - value).abs() > 1e-9 || !value.is_finite() {
            warn!(requested = value, used = threshold.value(), "confidence threshold adjusted");
        }
        threshold
    }

    pub fn value(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn raise(&mut self) -> f64 {
        self.0 = (self.0 + STEP).min(MAX);
        self.value()
    }

    pub fn lower(&mut self) -> f64 {
        self.0 = self.0.saturating_sub(STEP).max(MIN);
        self.value()
    }
}

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(20)
    }
}

impl From<f64> for ConfidenceThreshold {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<ConfidenceThreshold> for f64 {
    fn from(threshold: ConfidenceThreshold) -> Self {
        threshold.value()
    }
}

impl fmt::Display for ConfidenceThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.value())
    }
}
