//! Verdict & Cause Attribution
//!
//! Turns the model output and the motion rule into a labelled verdict.
//! Cause thresholds are fixed heuristics layered over the model; they do
//! not come from the trained forest.

use serde::{Deserialize, Serialize};

use crate::logic::dataset::Reading;
use crate::logic::model::Prediction;

// ============================================================================
// CONSTANTS
// ============================================================================

const GAS_LIMIT: f64 = 300.0;
const TEMP_LIMIT: f64 = 35.0;
const HUMIDITY_LIMIT: f64 = 80.0;

pub const REASON_MOTION: &str = "High Motion Detected! Check the Camera.";
pub const REASON_GAS: &str = "High Gas Levels Detected! Check Air Quality.";
pub const REASON_TEMP: &str = "High Temperature Detected!";
pub const REASON_HUMIDITY: &str = "High Humidity Detected!";
pub const REASON_UNKNOWN: &str = "Unusual Environment Patterns Detected.";
pub const REASON_NORMAL: &str = "Normal";
pub const REASON_NO_MODEL: &str = "No Model";

// ============================================================================
// VERDICT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Anomaly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: Label,
    pub reason: String,
}

impl Verdict {
    pub fn normal(reason: &str) -> Self {
        Self { label: Label::Normal, reason: reason.to_string() }
    }

    pub fn anomaly(reason: &str) -> Self {
        Self { label: Label::Anomaly, reason: reason.to_string() }
    }

    pub fn is_anomaly(&self) -> bool {
        self.label == Label::Anomaly
    }
}

/// First matching cause for an outlier reading
pub fn attribute_cause(reading: &Reading) -> &'static str {
    if reading.gas > GAS_LIMIT {
        REASON_GAS
    } else if reading.temp > TEMP_LIMIT {
        REASON_TEMP
    } else if reading.humidity > HUMIDITY_LIMIT {
        REASON_HUMIDITY
    } else {
        REASON_UNKNOWN
    }
}

/// Combine the signals. Motion density wins over the model.
/// `prediction` is `None` when no model is loaded.
pub fn decide(reading: &Reading, prediction: Option<Prediction>, motion_excessive: bool) -> Verdict {
    if motion_excessive {
        return Verdict::anomaly(REASON_MOTION);
    }

    match prediction {
        Some(Prediction::Outlier) => Verdict::anomaly(attribute_cause(reading)),
        Some(Prediction::Inlier) => Verdict::normal(REASON_NORMAL),
        None => Verdict::normal(REASON_NO_MODEL),
    }
}
