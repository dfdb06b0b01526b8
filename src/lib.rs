//! Owl Sentinel - Environmental Anomaly Detection Core
//!
//! Ingests temperature, humidity, gas and motion readings, logs them for
//! training, and flags anomalies by combining an isolation forest with a
//! motion-density rule.
//!
//! ```no_run
//! use owl_sentinel::logic::{AnomalyDetector, DetectorConfig, Reading};
//!
//! let detector = AnomalyDetector::new(DetectorConfig::from_env());
//! let verdict = detector.ingest(&Reading::new(24.0, 50.0, 800.0, 1))?;
//! println!("{}", verdict.reason);
//! # Ok::<(), owl_sentinel::logic::dataset::StoreError>(())
//! ```

pub mod constants;
pub mod logic;
