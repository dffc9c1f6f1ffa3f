//! Penalized linear model with cross-validated regularization strength.
use super::{FeatureImportance, PriceModel, kfold_indices, mse, rank_importance, to_matrix};
use crate::pipeline::split::Dataset;
use anyhow::{Context, Result, anyhow, ensure};
use itertools::Itertools;
use log::{debug, info};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::lasso::{Lasso, LassoParameters};

/// A fitted Lasso model at the cross-validation-selected regularization
/// strength.
///
/// Expects z-scored features (both when fitting and predicting); on scaled
/// data the coefficient magnitudes are directly comparable, so they double as
/// the importance scores.
pub struct LassoModel {
    inner: Lasso<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    feature_names: Vec<String>,
    /// The selected regularization strength
    pub alpha: f64,
}

/// Fit a Lasso on the (scaled) training data.
///
/// The regularization strength is chosen from `alphas` by k-fold
/// cross-validation minimizing mean validation MSE, then the model is refitted
/// on the full training set at the winning strength.
pub fn fit(train: &Dataset, alphas: &[f64], folds: usize, seed: u64) -> Result<LassoModel> {
    ensure!(!alphas.is_empty(), "lasso needs at least one candidate alpha");

    let fold_indices = kfold_indices(train.n_rows(), folds, seed);
    let mut best: Option<(f64, f64)> = None; // (alpha, mean validation MSE)
    for &alpha in alphas {
        let mut total = 0.0;
        for (fit_rows, validate_rows) in &fold_indices {
            let fit_fold = train.take_rows(fit_rows);
            let validate_fold = train.take_rows(validate_rows);

            let model = fit_at(&fit_fold, alpha)?;
            let predicted = model
                .predict(&to_matrix(&validate_fold))
                .map_err(|e| anyhow!("lasso prediction failed: {e}"))?;
            total += mse(&predicted, &validate_fold.target);
        }

        let mean_mse = total / fold_indices.len() as f64;
        debug!("lasso alpha {alpha}: mean validation MSE {mean_mse}");
        if best.is_none_or(|(_, best_mse)| mean_mse < best_mse) {
            best = Some((alpha, mean_mse));
        }
    }

    let (alpha, _) = best.context("no alpha candidate could be evaluated")?;
    info!("Selected lasso alpha {alpha} by {folds}-fold cross-validation");

    let inner = fit_at(train, alpha)?;
    Ok(LassoModel {
        inner,
        feature_names: train.feature_names.clone(),
        alpha,
    })
}

fn fit_at(train: &Dataset, alpha: f64) -> Result<Lasso<f64, f64, DenseMatrix<f64>, Vec<f64>>> {
    Lasso::fit(
        &to_matrix(train),
        &train.target,
        LassoParameters::default().with_alpha(alpha),
    )
    .map_err(|e| anyhow!("lasso training failed: {e}"))
}

impl LassoModel {
    /// Importance ranking by absolute coefficient magnitude
    pub fn coefficient_importance(&self) -> Vec<FeatureImportance> {
        let coefficients = self.inner.coefficients();
        let scores = self
            .feature_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), coefficients.get((i, 0)).abs()))
            .collect_vec();

        rank_importance(scores)
    }
}

impl PriceModel for LassoModel {
    fn name(&self) -> &'static str {
        "lasso"
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        self.inner
            .predict(&to_matrix(data))
            .map_err(|e| anyhow!("lasso prediction failed: {e}"))
    }
}
