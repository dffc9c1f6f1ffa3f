//! Bagged tree ensemble.
//!
//! Bagging rather than a random-subspace forest: every tree considers the
//! full feature set at every split (`m` = number of features), and trees
//! differ only through their bootstrap samples.
use super::{PriceModel, to_matrix};
use crate::pipeline::split::Dataset;
use anyhow::{Result, anyhow, ensure};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

/// A fitted bagged ensemble (bootstrap-averaged regression trees)
pub struct BaggingModel {
    inner: RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    /// Number of bootstrap trees in the ensemble
    pub n_trees: usize,
}

/// Fit a bagged ensemble of `n_trees` bootstrap trees on unscaled data
pub fn fit(train: &Dataset, n_trees: usize, seed: u64) -> Result<BaggingModel> {
    ensure!(n_trees > 0, "ensemble needs at least one tree");

    let parameters = RandomForestRegressorParameters {
        max_depth: None,
        min_samples_leaf: 1,
        min_samples_split: 2,
        n_trees,
        // All features at every split: bagging, not random-subspace
        m: Some(train.n_features()),
        keep_samples: false,
        seed,
    };

    let inner = RandomForestRegressor::fit(&to_matrix(train), &train.target, parameters)
        .map_err(|e| anyhow!("ensemble training failed: {e}"))?;

    Ok(BaggingModel { inner, n_trees })
}

impl PriceModel for BaggingModel {
    fn name(&self) -> &'static str {
        "bagging"
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        self.inner
            .predict(&to_matrix(data))
            .map_err(|e| anyhow!("ensemble prediction failed: {e}"))
    }
}
