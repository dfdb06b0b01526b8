use super::storage::{load_model, save_model, ModelArtifact};
use super::{fail_open, ForestConfig, ModelError, OutlierModel, Prediction, ScoreError};
use crate::logic::dataset::Reading;
use crate::logic::features::layout::FEATURE_VERSION;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use tempfile::tempdir;

fn normal_readings(n: usize, seed: u64) -> Vec<Reading> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            Reading::new(
                rng.gen_range(20.0..25.0),
                rng.gen_range(40.0..60.0),
                rng.gen_range(100.0..200.0),
                rng.gen_range(0..=1),
            )
        })
        .collect()
}

fn probes() -> Vec<Reading> {
    vec![
        Reading::new(22.0, 50.0, 150.0, 0),
        Reading::new(24.0, 50.0, 800.0, 1),
        Reading::new(40.0, 50.0, 150.0, 0),
        Reading::new(21.0, 90.0, 120.0, 1),
    ]
}

#[test]
fn test_untrained_model_assumes_normal() {
    let dir = tempdir().unwrap();
    let model = OutlierModel::new(dir.path().join("model.json"), ForestConfig::with_seed(1));

    assert!(!model.is_trained());
    assert_eq!(model.try_score(&Reading::new(24.0, 50.0, 9000.0, 1)), Ok(None));
    assert_eq!(model.score(&Reading::new(24.0, 50.0, 9000.0, 1)), Prediction::Inlier);
}

#[test]
fn test_train_requires_fifty_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let model = OutlierModel::new(&path, ForestConfig::with_seed(1));

    let result = model.train(&normal_readings(49, 1));
    assert!(matches!(result, Err(ModelError::InsufficientData { rows: 49, required: 50 })));
    assert!(!model.is_trained());
    assert!(!path.exists());
}

#[test]
fn test_train_persists_and_scores() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    let model = OutlierModel::new(&path, ForestConfig::with_seed(8));

    let artifact = model.train(&normal_readings(50, 8)).unwrap();
    assert_eq!(artifact.training_rows, 50);
    assert!(path.exists());
    assert!(model.is_trained());

    assert_eq!(model.score(&Reading::new(24.0, 50.0, 800.0, 1)), Prediction::Outlier);
    assert_eq!(Prediction::Outlier.label(), -1);
    assert_eq!(Prediction::Inlier.label(), 1);
}

#[test]
fn test_failed_training_keeps_previous_model() {
    let dir = tempdir().unwrap();
    let model = OutlierModel::new(dir.path().join("model.json"), ForestConfig::with_seed(5));
    model.train(&normal_readings(60, 5)).unwrap();

    let before: Vec<_> = probes().iter().map(|r| model.score(r)).collect();
    let trained_at = model.status().trained_at;

    assert!(model.train(&normal_readings(10, 6)).is_err());

    let after: Vec<_> = probes().iter().map(|r| model.score(r)).collect();
    assert_eq!(before, after);
    assert_eq!(model.status().trained_at, trained_at);
}

#[test]
fn test_failed_save_keeps_previous_model() {
    let dir = tempdir().unwrap();
    // Parent of the model path is a regular file, so saving fails
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "x").unwrap();

    let model = OutlierModel::new(blocker.join("model.json"), ForestConfig::with_seed(5));
    let result = model.train(&normal_readings(60, 5));

    assert!(matches!(result, Err(ModelError::Io(_))));
    assert!(!model.is_trained());
}

#[test]
fn test_load_restores_same_verdicts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let trained = OutlierModel::new(&path, ForestConfig::with_seed(21));
    trained.train(&normal_readings(80, 21)).unwrap();

    let loaded = OutlierModel::load(&path, ForestConfig::default());
    assert!(loaded.is_trained());

    for probe in probes() {
        assert_eq!(trained.try_score(&probe), loaded.try_score(&probe));
    }
    assert_eq!(loaded.status().training_rows, 80);
}

#[test]
fn test_load_missing_model_is_cold_start() {
    let dir = tempdir().unwrap();
    let model = OutlierModel::load(dir.path().join("absent.json"), ForestConfig::default());
    assert!(!model.is_trained());
    assert!(!model.status().model_loaded);
}

#[test]
fn test_load_corrupt_model_is_cold_start() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");
    fs::write(&path, b"not a model").unwrap();

    assert!(matches!(load_model(&path), Err(ModelError::Serialization(_))));

    let model = OutlierModel::load(&path, ForestConfig::default());
    assert!(!model.is_trained());
}

#[test]
fn test_load_rejects_layout_mismatch() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let model = OutlierModel::new(&path, ForestConfig::with_seed(3));
    let artifact = model.train(&normal_readings(50, 3)).unwrap();

    let mut stale: ModelArtifact = (*artifact).clone();
    stale.layout.version = FEATURE_VERSION + 1;
    save_model(&stale, &path).unwrap();

    assert!(matches!(load_model(&path), Err(ModelError::LayoutMismatch(_))));
}

#[test]
fn test_load_rejects_tampered_checksum() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.json");

    let model = OutlierModel::new(&path, ForestConfig::with_seed(3));
    let artifact = model.train(&normal_readings(50, 3)).unwrap();

    let mut tampered: ModelArtifact = (*artifact).clone();
    tampered.checksum = "00".repeat(32);
    save_model(&tampered, &path).unwrap();

    assert!(matches!(load_model(&path), Err(ModelError::ChecksumMismatch { .. })));
    assert!(!OutlierModel::load(&path, ForestConfig::default()).is_trained());
}

#[test]
fn test_score_error_is_fail_open() {
    let dir = tempdir().unwrap();
    let model = OutlierModel::new(dir.path().join("model.json"), ForestConfig::with_seed(9));
    model.train(&normal_readings(50, 9)).unwrap();

    let broken = Reading::new(f64::NAN, 50.0, 800.0, 0);
    assert!(matches!(model.try_score(&broken), Err(ScoreError::NonFinite { feature: "temp", .. })));
    assert_eq!(model.score(&broken), Prediction::Inlier);
}

#[test]
fn test_fail_open_policy() {
    assert_eq!(fail_open(Err(ScoreError::EmptyModel)), Some(Prediction::Inlier));
    assert_eq!(fail_open(Ok(None)), None);
    assert_eq!(fail_open(Ok(Some(Prediction::Outlier))), Some(Prediction::Outlier));
}
