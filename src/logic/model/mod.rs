//! Model Module - Outlier Model Training & Scoring
//!
//! Holds the isolation forest snapshot, persists it as a versioned
//! artifact, and scores single readings.
//!
//! # Failure Strategy
//! Training errors leave the current snapshot untouched. Scoring errors
//! surface as `ScoreError` and are mapped to an inlier by [`fail_open`].

pub mod forest;
pub mod storage;
pub mod outlier;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::logic::features::layout::LayoutMismatchError;

pub use forest::{FitError, ForestConfig, IsolationForest};
pub use outlier::{ModelStatus, OutlierModel};
pub use storage::ModelArtifact;

/// Model verdict for one reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prediction {
    Inlier,
    Outlier,
}

impl Prediction {
    /// Numeric label: 1 for inliers, -1 for outliers
    pub fn label(self) -> i8 {
        match self {
            Prediction::Inlier => 1,
            Prediction::Outlier => -1,
        }
    }
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Not enough data to train: {rows} rows, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("Fit Error: {0}")]
    Fit(#[from] FitError),

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization Error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    LayoutMismatch(#[from] LayoutMismatchError),

    #[error("Model checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },
}

/// Failure while scoring a single reading
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("feature '{feature}' is not finite: {value}")]
    NonFinite { feature: &'static str, value: f64 },

    #[error("model has no trees")]
    EmptyModel,

    #[error("model produced an invalid score: {0}")]
    InvalidScore(f64),
}

/// Fail-open policy: a reading that cannot be scored counts as an inlier.
///
/// `Ok(None)` (no model loaded) passes through unchanged so callers can
/// tell a cold start apart from a scored inlier.
pub fn fail_open(result: Result<Option<Prediction>, ScoreError>) -> Option<Prediction> {
    match result {
        Ok(prediction) => prediction,
        Err(e) => {
            log::warn!("Scoring failed ({}), assuming normal", e);
            Some(Prediction::Inlier)
        }
    }
}
