use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::forest::IsolationForest;
use super::ModelError;
use crate::logic::features::layout::LayoutInfo;

/// Persisted model: the forest plus what it was trained against
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub layout: LayoutInfo,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,

    /// SHA-256 (hex) of the serialized forest
    pub checksum: String,
    pub forest: IsolationForest,
}

impl ModelArtifact {
    pub fn new(forest: IsolationForest, training_rows: usize) -> Result<Self, ModelError> {
        let checksum = forest_checksum(&forest)?;
        Ok(Self {
            layout: LayoutInfo::current(),
            trained_at: Utc::now(),
            training_rows,
            checksum,
            forest,
        })
    }
}

fn forest_checksum(forest: &IsolationForest) -> Result<String, ModelError> {
    let bytes = serde_json::to_vec(forest)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Save artifact to disk (temp file + rename)
pub fn save_model(artifact: &ModelArtifact, path: &Path) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_vec(artifact)?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Load artifact from disk with layout and checksum validation
pub fn load_model(path: &Path) -> Result<ModelArtifact, ModelError> {
    let data = fs::read(path)?;
    let artifact: ModelArtifact = serde_json::from_slice(&data)?;

    artifact.layout.validate()?;

    let actual = forest_checksum(&artifact.forest)?;
    if actual != artifact.checksum {
        return Err(ModelError::ChecksumMismatch {
            expected: artifact.checksum,
            actual,
        });
    }

    Ok(artifact)
}
