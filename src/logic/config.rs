//! Detector Configuration
//!
//! Paths and tuning consumed by the detector core. Defaults match a
//! working-directory deployment; `from_env` is what the binary uses.

use std::path::{Path, PathBuf};

use crate::constants::{self, DEFAULT_DATA_FILE, DEFAULT_MODEL_FILE};
use crate::logic::model::ForestConfig;
use crate::logic::motion::MotionConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Feature table (CSV)
    pub data_file: PathBuf,

    /// Persisted model artifact
    pub model_file: PathBuf,

    /// Motion density window
    pub motion: MotionConfig,

    /// Isolation forest parameters
    pub forest: ForestConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            model_file: PathBuf::from(DEFAULT_MODEL_FILE),
            motion: MotionConfig::default(),
            forest: ForestConfig::default(),
        }
    }
}

impl DetectorConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            data_file: constants::get_data_file(),
            model_file: constants::get_model_file(),
            motion: MotionConfig {
                window_size: constants::get_window_size(),
                threshold: constants::get_motion_threshold(),
            },
            forest: ForestConfig {
                seed: constants::get_seed(),
                ..Default::default()
            },
        }
    }

    /// Default file names placed under `dir`
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            data_file: dir.join(DEFAULT_DATA_FILE),
            model_file: dir.join(DEFAULT_MODEL_FILE),
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.forest.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectorConfig::default();
        assert_eq!(config.data_file, PathBuf::from("sensor_data.csv"));
        assert_eq!(config.model_file, PathBuf::from("model.json"));
        assert_eq!(config.motion.window_size, 20);
        assert_eq!(config.motion.threshold, 10);
        assert_eq!(config.forest.contamination, 0.01);
        assert_eq!(config.forest.min_training_rows, 50);
    }

    #[test]
    fn test_in_dir() {
        let config = DetectorConfig::in_dir(Path::new("/var/lib/owl")).with_seed(4);
        assert_eq!(config.data_file, PathBuf::from("/var/lib/owl/sensor_data.csv"));
        assert_eq!(config.model_file, PathBuf::from("/var/lib/owl/model.json"));
        assert_eq!(config.forest.seed, Some(4));
    }
}
