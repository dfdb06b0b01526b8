//! Isolation Forest - Novelty Detection Ensemble
//!
//! Random axis-aligned partitions isolate rare points in few splits, so a
//! short average path length across the ensemble marks an outlier.
//!
//! Scores follow the usual convention: `score_sample` is the negated
//! anomaly score in `[-1, 0)`, lower meaning more abnormal. The decision
//! offset is the `contamination` quantile of the training scores.
//!
//! Each tree also keeps the bounding box of its sub-sample. A point outside
//! that box is isolated at the root (path length 1). Plain isolation trees
//! route such a point like the most extreme training sample, which leaves
//! a large spike such as gas 800 against a 100-200 history scored as normal.
//!
//! The trade-off is strictness about the training hull: a value just past
//! the largest training value is flagged, and so is any change in a feature
//! that was constant during training (for example a motion flag that was
//! always 0). Inside the hull, paths are those of a plain isolation tree.
//! Train on data that covers the expected operating range.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{Prediction, ScoreError};
use crate::logic::features::{layout::feature_name, FeatureVector, FEATURE_COUNT};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Forest hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble
    pub n_estimators: usize,

    /// Sub-sample size per tree (capped at the row count)
    pub max_samples: usize,

    /// Expected share of outliers in the training data
    pub contamination: f64,

    /// Rows required before fitting is attempted
    pub min_training_rows: usize,

    /// Fixed RNG seed, `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_samples: 256,
            contamination: 0.01,
            min_training_rows: 50,
            seed: None,
        }
    }
}

impl ForestConfig {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FitError {
    #[error("no training rows")]
    Empty,

    #[error("n_estimators must be at least 1")]
    NoEstimators,

    #[error("contamination must be in (0, 0.5], got {0}")]
    Contamination(f64),

    #[error("row {row}: feature '{feature}' is not finite")]
    NonFinite { row: usize, feature: &'static str },
}

// ============================================================================
// TREE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Bounds {
    min: FeatureVector,
    max: FeatureVector,
}

impl Bounds {
    /// Bounding box of a non-empty index set
    fn of(data: &[FeatureVector], indices: &[usize]) -> Self {
        let mut min = [f64::MAX; FEATURE_COUNT];
        let mut max = [f64::MIN; FEATURE_COUNT];

        for &i in indices {
            for f in 0..FEATURE_COUNT {
                min[f] = min[f].min(data[i][f]);
                max[f] = max[f].max(data[i][f]);
            }
        }

        Self { min, max }
    }

    fn contains(&self, x: &FeatureVector) -> bool {
        (0..FEATURE_COUNT).all(|f| x[f] >= self.min[f] && x[f] <= self.max[f])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IsolationTree {
    /// Hull of the tree's sub-sample
    bounds: Bounds,
    root: Node,
}

impl IsolationTree {
    fn fit(data: &[FeatureVector], indices: &mut [usize], max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            bounds: Bounds::of(data, indices),
            root: grow(data, indices, 0, max_depth, rng),
        }
    }

    fn path_length(&self, x: &FeatureVector) -> f64 {
        if !self.bounds.contains(x) {
            return 1.0;
        }

        let mut node = &self.root;
        let mut depth = 0.0;

        loop {
            match node {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { feature, threshold, left, right } => {
                    node = if x[*feature] < *threshold { left } else { right };
                    depth += 1.0;
                }
            }
        }
    }
}

fn grow(
    data: &[FeatureVector],
    indices: &mut [usize],
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    let leaf = |size: usize| Node::Leaf { size };

    if depth >= max_depth || indices.len() <= 1 {
        return leaf(indices.len());
    }

    // Only features that still vary can split this node
    let bounds = Bounds::of(data, indices);
    let candidates: Vec<usize> = (0..FEATURE_COUNT)
        .filter(|&f| bounds.max[f] > bounds.min[f])
        .collect();

    let feature = match candidates.choose(rng) {
        Some(&f) => f,
        None => return leaf(indices.len()),
    };

    // Interpolate instead of sampling `min..max`: the width can overflow
    // to infinity for extreme but finite values
    let u: f64 = rng.gen();
    let threshold = bounds.min[feature] * (1.0 - u) + bounds.max[feature] * u;

    let mut split = 0;
    for i in 0..indices.len() {
        if data[indices[i]][feature] < threshold {
            indices.swap(i, split);
            split += 1;
        }
    }

    if split == 0 || split == indices.len() {
        return leaf(indices.len());
    }

    let (lower, upper) = indices.split_at_mut(split);
    Node::Split {
        feature,
        threshold,
        left: Box::new(grow(data, lower, depth + 1, max_depth, rng)),
        right: Box::new(grow(data, upper, depth + 1, max_depth, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Linear-interpolated percentile, `q` in `[0, 1]`
fn quantile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(|a, b| a.total_cmp(b));

    let rank = q * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;

    values[lo] + (values[hi] - values[lo]) * (rank - lo as f64)
}

// ============================================================================
// FOREST
// ============================================================================

/// Fitted isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    contamination: f64,
    offset: f64,
}

impl IsolationForest {
    pub fn fit(data: &[FeatureVector], config: &ForestConfig) -> Result<Self, FitError> {
        if data.is_empty() {
            return Err(FitError::Empty);
        }
        if config.n_estimators == 0 {
            return Err(FitError::NoEstimators);
        }
        if !(config.contamination > 0.0 && config.contamination <= 0.5) {
            return Err(FitError::Contamination(config.contamination));
        }
        for (row, x) in data.iter().enumerate() {
            if let Some(f) = x.iter().position(|v| !v.is_finite()) {
                return Err(FitError::NonFinite { row, feature: feature_name(f).unwrap_or("?") });
            }
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let sample_size = config.max_samples.clamp(1, data.len());
        let max_depth = (sample_size.max(2) as f64).log2().ceil() as usize;

        let trees = (0..config.n_estimators)
            .map(|_| {
                let mut indices = rand::seq::index::sample(&mut rng, data.len(), sample_size).into_vec();
                IsolationTree::fit(data, &mut indices, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            contamination: config.contamination,
            offset: 0.0,
        };

        let mut training_scores: Vec<f64> = data.iter().map(|x| forest.raw_score(x)).collect();
        forest.offset = quantile(&mut training_scores, config.contamination);

        Ok(forest)
    }

    fn raw_score(&self, x: &FeatureVector) -> f64 {
        let mean_path = self.trees.iter().map(|t| t.path_length(x)).sum::<f64>() / self.trees.len() as f64;
        -(2f64.powf(-mean_path / average_path_length(self.sample_size).max(1.0)))
    }

    /// Negated anomaly score, lower is more abnormal
    pub fn score_sample(&self, x: &FeatureVector) -> Result<f64, ScoreError> {
        if let Some(f) = x.iter().position(|v| !v.is_finite()) {
            return Err(ScoreError::NonFinite {
                feature: feature_name(f).unwrap_or("?"),
                value: x[f],
            });
        }
        if self.trees.is_empty() {
            return Err(ScoreError::EmptyModel);
        }

        let score = self.raw_score(x);
        if !score.is_finite() {
            return Err(ScoreError::InvalidScore(score));
        }
        Ok(score)
    }

    /// Distance to the decision boundary, negative for outliers
    pub fn decision_function(&self, x: &FeatureVector) -> Result<f64, ScoreError> {
        Ok(self.score_sample(x)? - self.offset)
    }

    pub fn predict(&self, x: &FeatureVector) -> Result<Prediction, ScoreError> {
        if self.decision_function(x)? < 0.0 {
            Ok(Prediction::Outlier)
        } else {
            Ok(Prediction::Inlier)
        }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn normal_rows(n: usize, seed: u64) -> Vec<FeatureVector> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                [
                    rng.gen_range(20.0..25.0),
                    rng.gen_range(40.0..60.0),
                    rng.gen_range(100.0..200.0),
                    f64::from(rng.gen_range(0u8..=1)),
                ]
            })
            .collect()
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(0), 0.0);
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!((c256 - 10.244).abs() < 0.01, "c(256) = {}", c256);
    }

    #[test]
    fn test_quantile_interpolates() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&mut values, 0.0), 1.0);
        assert_eq!(quantile(&mut values, 1.0), 4.0);
        assert!((quantile(&mut values, 0.5) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let config = ForestConfig::with_seed(1);
        assert_eq!(IsolationForest::fit(&[], &config), Err(FitError::Empty));

        let rows = vec![[1.0, f64::NAN, 0.0, 0.0]];
        assert!(matches!(
            IsolationForest::fit(&rows, &config),
            Err(FitError::NonFinite { row: 0, feature: "humidity" })
        ));

        let bad = ForestConfig { contamination: 0.0, ..config };
        assert!(matches!(IsolationForest::fit(&normal_rows(10, 1), &bad), Err(FitError::Contamination(_))));
    }

    #[test]
    fn test_fit_shape() {
        let rows = normal_rows(60, 7);
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(7)).unwrap();

        assert_eq!(forest.n_trees(), 100);
        assert_eq!(forest.sample_size(), 60);
        assert!(forest.offset() < 0.0 && forest.offset() > -1.0);
    }

    #[test]
    fn test_contamination_flags_few_training_rows() {
        let rows = normal_rows(200, 3);
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(3)).unwrap();

        let flagged = rows
            .iter()
            .filter(|x| forest.predict(x).unwrap() == Prediction::Outlier)
            .count();
        assert!(flagged <= 4, "flagged {} of 200", flagged);
    }

    #[test]
    fn test_far_point_is_outlier() {
        let rows = normal_rows(50, 11);
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(11)).unwrap();

        let spike = [24.0, 50.0, 800.0, 1.0];
        assert_eq!(forest.predict(&spike).unwrap(), Prediction::Outlier);

        let centre = [22.5, 50.0, 150.0, 1.0];
        assert!(forest.score_sample(&spike).unwrap() < forest.score_sample(&centre).unwrap());
    }

    #[test]
    fn test_same_seed_same_forest() {
        let rows = normal_rows(80, 5);
        let a = IsolationForest::fit(&rows, &ForestConfig::with_seed(99)).unwrap();
        let b = IsolationForest::fit(&rows, &ForestConfig::with_seed(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_constant_data_does_not_panic() {
        let rows = vec![[21.0, 45.0, 120.0, 0.0]; 60];
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(2)).unwrap();

        assert_eq!(forest.predict(&[21.0, 45.0, 120.0, 0.0]).unwrap(), Prediction::Inlier);
        assert_eq!(forest.predict(&[21.0, 45.0, 900.0, 0.0]).unwrap(), Prediction::Outlier);
    }

    #[test]
    fn test_extreme_finite_values_fit_without_panic() {
        let rows: Vec<FeatureVector> = (0..60)
            .map(|i| {
                let temp = if i % 2 == 0 { 1.7e308 } else { -1.7e308 };
                [temp, 50.0, 150.0, 0.0]
            })
            .collect();

        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(8)).unwrap();
        assert!(forest.offset().is_finite());
        assert!(forest.score_sample(&[0.0, 50.0, 150.0, 0.0]).unwrap().is_finite());
    }

    #[test]
    fn test_constant_feature_change_is_outlier() {
        let rows: Vec<FeatureVector> = normal_rows(80, 6).into_iter().map(|x| [x[0], x[1], x[2], 0.0]).collect();
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(6)).unwrap();

        assert_eq!(forest.predict(&[22.5, 50.0, 150.0, 0.0]).unwrap(), Prediction::Inlier);
        assert_eq!(forest.predict(&[22.5, 50.0, 150.0, 1.0]).unwrap(), Prediction::Outlier);
    }

    #[test]
    fn test_non_finite_input_is_score_error() {
        let rows = normal_rows(50, 4);
        let forest = IsolationForest::fit(&rows, &ForestConfig::with_seed(4)).unwrap();

        let err = forest.predict(&[f64::NAN, 50.0, 150.0, 0.0]).unwrap_err();
        assert!(matches!(err, ScoreError::NonFinite { feature: "temp", .. }));
    }
}
