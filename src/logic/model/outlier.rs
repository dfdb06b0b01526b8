//! Outlier Model - Snapshot Holder
//!
//! Readers clone an `Arc` of the current snapshot and score without holding
//! the lock; training builds a complete new snapshot and swaps it in, so a
//! concurrent scorer sees either the old model or the new one.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::forest::{ForestConfig, IsolationForest};
use super::storage::{self, ModelArtifact};
use super::{fail_open, ModelError, Prediction, ScoreError};
use crate::logic::dataset::Reading;

/// Model status for status reports
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub model_path: String,
    pub trained_at: Option<DateTime<Utc>>,
    pub training_rows: usize,
    pub n_trees: usize,
    pub offset: Option<f64>,
}

pub struct OutlierModel {
    model_file: PathBuf,
    config: ForestConfig,
    snapshot: RwLock<Option<Arc<ModelArtifact>>>,
}

impl OutlierModel {
    /// Untrained model that will persist to `model_file`
    pub fn new(model_file: impl Into<PathBuf>, config: ForestConfig) -> Self {
        Self {
            model_file: model_file.into(),
            config,
            snapshot: RwLock::new(None),
        }
    }

    /// Load the persisted model, falling back to untrained on any failure
    pub fn load(model_file: impl Into<PathBuf>, config: ForestConfig) -> Self {
        let model = Self::new(model_file, config);

        match storage::load_model(&model.model_file) {
            Ok(artifact) => {
                log::info!(
                    "Model loaded from {} (trained {}, {} rows)",
                    model.model_file.display(), artifact.trained_at, artifact.training_rows
                );
                *model.snapshot.write() = Some(Arc::new(artifact));
            }
            Err(ModelError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No model found at {}. Please train first.", model.model_file.display());
            }
            Err(e) => {
                log::warn!("Error loading model from {}: {}. Starting untrained.", model.model_file.display(), e);
            }
        }

        model
    }

    pub fn model_file(&self) -> &Path {
        &self.model_file
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit a new forest on `rows`, persist it, then swap it in.
    /// On error the current snapshot is left as it was.
    pub fn train(&self, rows: &[Reading]) -> Result<Arc<ModelArtifact>, ModelError> {
        if rows.len() < self.config.min_training_rows {
            return Err(ModelError::InsufficientData {
                rows: rows.len(),
                required: self.config.min_training_rows,
            });
        }

        let features: Vec<_> = rows.iter().map(Reading::to_features).collect();
        let forest = IsolationForest::fit(&features, &self.config)?;
        let artifact = Arc::new(ModelArtifact::new(forest, rows.len())?);

        storage::save_model(&artifact, &self.model_file)?;
        *self.snapshot.write() = Some(Arc::clone(&artifact));

        log::info!(
            "Model trained on {} rows and saved to {} (offset {:.4})",
            rows.len(), self.model_file.display(), artifact.forest.offset()
        );

        Ok(artifact)
    }

    /// Score one reading. `Ok(None)` means no model is loaded.
    pub fn try_score(&self, reading: &Reading) -> Result<Option<Prediction>, ScoreError> {
        let snapshot = self.snapshot.read().clone();

        match snapshot {
            Some(model) => model.forest.predict(&reading.to_features()).map(Some),
            None => Ok(None),
        }
    }

    /// Score with the cold-start and fail-open policies applied
    pub fn score(&self, reading: &Reading) -> Prediction {
        fail_open(self.try_score(reading)).unwrap_or(Prediction::Inlier)
    }

    pub fn is_trained(&self) -> bool {
        self.snapshot.read().is_some()
    }

    /// Current snapshot, if any
    pub fn snapshot(&self) -> Option<Arc<ModelArtifact>> {
        self.snapshot.read().clone()
    }

    pub fn status(&self) -> ModelStatus {
        let snapshot = self.snapshot();

        ModelStatus {
            model_loaded: snapshot.is_some(),
            model_path: self.model_file.display().to_string(),
            trained_at: snapshot.as_ref().map(|s| s.trained_at),
            training_rows: snapshot.as_ref().map_or(0, |s| s.training_rows),
            n_trees: snapshot.as_ref().map_or(0, |s| s.forest.n_trees()),
            offset: snapshot.as_ref().map(|s| s.forest.offset()),
        }
    }
}
