//! Central Configuration Constants
//!
//! Single source of truth for detector defaults.
//! Every value here can be overridden through the environment.

use std::path::PathBuf;

/// Default feature table file name
pub const DEFAULT_DATA_FILE: &str = "sensor_data.csv";

/// Default model artifact file name
pub const DEFAULT_MODEL_FILE: &str = "model.json";

/// Number of motion flags kept in the density window
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Motion events within the window that count as excessive
pub const DEFAULT_MOTION_THRESHOLD: u32 = 10;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "owl-sentinel";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Directory used when no explicit file paths are configured
pub fn get_data_dir() -> PathBuf {
    std::env::var("OWL_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_NAME)
        })
}

/// Get feature table path from environment or use default
pub fn get_data_file() -> PathBuf {
    std::env::var("OWL_DATA_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join(DEFAULT_DATA_FILE))
}

/// Get model artifact path from environment or use default
pub fn get_model_file() -> PathBuf {
    std::env::var("OWL_MODEL_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| get_data_dir().join(DEFAULT_MODEL_FILE))
}

/// Get motion window size from environment or use default
pub fn get_window_size() -> usize {
    std::env::var("OWL_WINDOW_SIZE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(DEFAULT_WINDOW_SIZE)
}

/// Get motion threshold from environment or use default
pub fn get_motion_threshold() -> u32 {
    std::env::var("OWL_MOTION_THRESHOLD")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_MOTION_THRESHOLD)
}

/// Optional fixed seed for reproducible model fits
pub fn get_seed() -> Option<u64> {
    std::env::var("OWL_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
}
