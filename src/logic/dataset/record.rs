use serde::{Deserialize, Deserializer, Serialize};

use crate::logic::features::FeatureVector;

/// One sensor sample as sent by the edge device.
///
/// Field order matches the feature layout and the CSV header. Fields missing
/// from a caller payload decode as 0.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Reading {
    #[serde(default)]
    pub temp: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub gas: f64,
    #[serde(default, deserialize_with = "lenient_motion")]
    pub motion: u8,
}

/// Motion as sent by devices: integer, float or boolean
#[derive(Deserialize)]
#[serde(untagged)]
enum MotionValue {
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Truncate like an integer cast, then collapse to a 0/1 flag
fn lenient_motion<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let flag = match MotionValue::deserialize(deserializer)? {
        MotionValue::Int(v) => v != 0,
        MotionValue::Float(v) => v.trunc() != 0.0,
        MotionValue::Bool(v) => v,
    };
    Ok(u8::from(flag))
}

impl Reading {
    pub fn new(temp: f64, humidity: f64, gas: f64, motion: u8) -> Self {
        Self { temp, humidity, gas, motion }
    }

    /// Decode a JSON payload, defaulting absent fields to 0
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Motion as a strict 0/1 flag
    pub fn motion_flag(&self) -> u8 {
        u8::from(self.motion != 0)
    }

    /// Project onto the fixed feature order
    pub fn to_features(&self) -> FeatureVector {
        [self.temp, self.humidity, self.gas, f64::from(self.motion_flag())]
    }
}
