//! Detector Module - Ingest & Retrain Orchestration
//!
//! `AnomalyDetector` owns the feature store, the outlier model and the
//! motion window. Request handlers share one instance by reference.
//!
//! # Flow
//! ```text
//! ingest(reading)
//!   ├─ FeatureStore::append      (log first, errors propagate)
//!   ├─ OutlierModel::try_score   (fail-open on ScoreError)
//!   ├─ MotionTracker::update     (scored readings only, overrides model)
//!   └─ decide()                  → Verdict
//! ```

pub mod verdict;


use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::logic::config::DetectorConfig;
use crate::logic::dataset::{FeatureStore, Reading, StoreError};
use crate::logic::model::{fail_open, ModelArtifact, ModelError, ModelStatus, OutlierModel};
use crate::logic::motion::MotionTracker;

pub use verdict::{attribute_cause, decide, Label, Verdict};

/// Training pipeline failure
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    #[error("Feature table error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Combined status for reporting
#[derive(Debug, Clone, Serialize)]
pub struct DetectorStatus {
    pub model: ModelStatus,
    pub stored_rows: usize,
    pub motion_events: u32,
    pub motion_window: usize,
}

pub struct AnomalyDetector {
    config: DetectorConfig,
    store: FeatureStore,
    model: OutlierModel,
    motion: Mutex<MotionTracker>,
}

impl AnomalyDetector {
    /// Build a detector and load any persisted model
    pub fn new(config: DetectorConfig) -> Self {
        let store = FeatureStore::new(config.data_file.clone());
        let model = OutlierModel::load(config.model_file.clone(), config.forest);
        let motion = Mutex::new(MotionTracker::new(config.motion));

        Self { config, store, model, motion }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn model(&self) -> &OutlierModel {
        &self.model
    }

    /// Log a reading and classify it
    pub fn ingest(&self, reading: &Reading) -> Result<Verdict, StoreError> {
        self.store.append(reading)?;

        let verdict = match self.model.try_score(reading) {
            Ok(Some(prediction)) => {
                let motion_excessive = {
                    let mut tracker = self.motion.lock();
                    tracker.update(reading.motion);
                    tracker.is_excessive()
                };
                decide(reading, Some(prediction), motion_excessive)
            }
            // Cold start and scoring failures skip the motion window
            scored => decide(reading, fail_open(scored), false),
        };

        if verdict.is_anomaly() {
            log::warn!("ANOMALY DETECTED: {}", verdict.reason);
        } else {
            log::debug!("Reading {:?}: {}", reading, verdict.reason);
        }

        Ok(verdict)
    }

    /// Retrain from the full feature table
    pub fn try_train(&self) -> Result<Arc<ModelArtifact>, TrainError> {
        let rows = self.store.load_all()?;
        Ok(self.model.train(&rows)?)
    }

    /// Retrain, reporting only success. Failures are logged, never fatal.
    pub fn train(&self) -> bool {
        match self.try_train() {
            Ok(_) => true,
            Err(e) => {
                log::error!("Training failed: {}", e);
                false
            }
        }
    }

    pub fn status(&self) -> DetectorStatus {
        let stored_rows = self.store.row_count().unwrap_or_else(|e| {
            log::warn!("Could not count stored rows: {}", e);
            0
        });
        let tracker = self.motion.lock();

        DetectorStatus {
            model: self.model.status(),
            stored_rows,
            motion_events: tracker.motion_count(),
            motion_window: tracker.len(),
        }
    }
}
