//! Features Module - Sensor Feature Schema
//!
//! Defines the fixed feature order used by the feature table and the model,
//! and the projection of a reading onto that order.

pub mod layout;

pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION, LayoutInfo, layout_hash};

/// Fixed-order feature vector: `[temp, humidity, gas, motion]`
pub type FeatureVector = [f64; FEATURE_COUNT];
