//! Logic Module - Anomaly Detection Core
//!
//! - `features/` - Feature layout shared by the table and the model
//! - `dataset/` - Append-only feature table (CSV)
//! - `motion` - Motion density window
//! - `model/` - Isolation forest training, persistence, scoring
//! - `detector/` - Ingest/retrain orchestration and cause attribution

pub mod config;
pub mod features;
pub mod dataset;
pub mod motion;
pub mod model;
pub mod detector;

pub use config::DetectorConfig;
pub use dataset::{FeatureStore, Reading};
pub use detector::{AnomalyDetector, Label, Verdict};
pub use motion::{MotionConfig, MotionTracker};
pub use model::{ForestConfig, OutlierModel, Prediction};
