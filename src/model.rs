//! The model layer: three black-box regressors and their shared plumbing.
//!
//! Model induction itself (coordinate-descent Lasso, recursive tree
//! splitting, bootstrap ensembles) comes from `smartcore`; this module owns
//! how those collaborators are used: cross-validated hyperparameter
//! selection, MSE scoring, variable subsets and importance ranking.
use crate::pipeline::fuse::WEATHER_FEATURE_LABELS;
use crate::pipeline::split::Dataset;
use anyhow::Result;
use itertools::Itertools;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use smartcore::linalg::basic::matrix::DenseMatrix;

pub mod bagging;
pub mod lasso;
pub mod tree;

/// A fitted regression model which can predict prices for a dataset
pub trait PriceModel {
    /// Short name used in reports
    fn name(&self) -> &'static str;

    /// Predict the target for every row of the dataset
    fn predict(&self, data: &Dataset) -> Result<Vec<f64>>;
}

/// Mean squared error between predictions and observed values
pub fn mse(predicted: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(predicted.len(), actual.len());
    let n = actual.len() as f64;
    predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (a - p).powi(2))
        .sum::<f64>()
        / n
}

/// The importance score attributed to one feature by a fitted model
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    /// The feature's column label
    pub feature: String,
    /// Importance score (larger means more important); comparable within one
    /// model only
    pub importance: f64,
}

/// Sort feature scores into a ranked importance list (descending)
pub fn rank_importance(scores: Vec<(String, f64)>) -> Vec<FeatureImportance> {
    scores
        .into_iter()
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .sorted_by(|a, b| b.importance.total_cmp(&a.importance))
        .collect()
}

/// Permutation importance: the increase in test MSE when one feature column
/// is shuffled, breaking its relationship with the target.
///
/// Used for the tree-based models, whose collaborators do not expose internal
/// importance scores.
pub fn permutation_importance(
    model: &dyn PriceModel,
    test: &Dataset,
    seed: u64,
) -> Result<Vec<FeatureImportance>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let baseline = mse(&model.predict(test)?, &test.target);

    let mut scores = Vec::with_capacity(test.n_features());
    for feature in 0..test.n_features() {
        let mut shuffled = test.clone();
        let mut column = shuffled
            .rows
            .iter()
            .map(|row| row[feature])
            .collect_vec();
        column.shuffle(&mut rng);
        for (row, value) in shuffled.rows.iter_mut().zip(column) {
            row[feature] = value;
        }

        let shuffled_mse = mse(&model.predict(&shuffled)?, &test.target);
        scores.push((
            test.feature_names[feature].clone(),
            shuffled_mse - baseline,
        ));
    }

    Ok(rank_importance(scores))
}

/// The three variable subsets each model is fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableSubset {
    /// Every feature of the fused table
    All,
    /// Generation-by-source features only
    Production,
    /// Aggregated weather features only
    Weather,
}

impl VariableSubset {
    /// All subsets, in reporting order
    pub const ALL_SUBSETS: [Self; 3] = [Self::All, Self::Production, Self::Weather];

    /// Label used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Production => "production",
            Self::Weather => "weather",
        }
    }

    /// Restrict a dataset to this subset's features
    pub fn filter(&self, dataset: &Dataset) -> Result<Dataset> {
        let keep = dataset
            .feature_names
            .iter()
            .map(String::as_str)
            .filter(|name| match self {
                Self::All => true,
                Self::Production => !WEATHER_FEATURE_LABELS.contains(name),
                Self::Weather => WEATHER_FEATURE_LABELS.contains(name),
            })
            .collect_vec();

        dataset.select_features(&keep)
    }
}

/// Deterministic shuffled k-fold split of `n` row indices.
///
/// Every index appears in exactly one validation fold.
pub(crate) fn kfold_indices(n: usize, k: usize, seed: u64) -> Vec<(Vec<usize>, Vec<usize>)> {
    assert!(k >= 2, "cross-validation needs at least two folds");

    let mut indices = (0..n).collect_vec();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    (0..k)
        .map(|fold| {
            let validate = indices
                .iter()
                .copied()
                .skip(fold)
                .step_by(k)
                .collect_vec();
            let train = indices
                .iter()
                .copied()
                .filter(|index| !validate.contains(index))
                .collect_vec();
            (train, validate)
        })
        .collect()
}

/// Convert feature rows to the matrix type the collaborators consume
pub(crate) fn to_matrix(dataset: &Dataset) -> DenseMatrix<f64> {
    let n_rows = dataset.n_rows();
    let n_features = dataset.n_features();
    let mut flat = Vec::with_capacity(n_rows * n_features);
    for row in &dataset.rows {
        flat.extend_from_slice(row);
    }

    DenseMatrix::new(n_rows, n_features, flat, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    fn mse_known_value() {
        assert_approx_eq!(f64, mse(&[1.0, 2.0], &[3.0, 2.0]), 2.0);
        assert_approx_eq!(f64, mse(&[1.0], &[1.0]), 0.0);
    }

    #[rstest]
    fn importance_ranked_descending() {
        let ranked = rank_importance(vec![
            ("a".to_string(), 0.5),
            ("b".to_string(), 2.0),
            ("c".to_string(), -0.1),
        ]);
        let order = ranked.iter().map(|f| f.feature.as_str()).collect_vec();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[rstest]
    fn kfold_partitions_all_indices() {
        let folds = kfold_indices(23, 5, 1);
        assert_eq!(folds.len(), 5);

        let mut seen = HashSet::new();
        for (train, validate) in &folds {
            assert_eq!(train.len() + validate.len(), 23);
            for index in validate {
                assert!(seen.insert(*index), "index {index} validated twice");
                assert!(!train.contains(index));
            }
        }
        assert_eq!(seen.len(), 23);
    }

    #[rstest]
    fn subsets_filter_by_weather_labels() {
        let dataset = Dataset {
            feature_names: vec![
                "Nuclear".to_string(),
                "Avg. Temp".to_string(),
                "Coal".to_string(),
            ],
            rows: vec![vec![1.0, 2.0, 3.0]],
            target: vec![10.0],
        };

        let production = VariableSubset::Production.filter(&dataset).unwrap();
        assert_eq!(production.feature_names, vec!["Nuclear", "Coal"]);

        let weather = VariableSubset::Weather.filter(&dataset).unwrap();
        assert_eq!(weather.feature_names, vec!["Avg. Temp"]);

        let all = VariableSubset::All.filter(&dataset).unwrap();
        assert_eq!(all.n_features(), 3);
    }
}
