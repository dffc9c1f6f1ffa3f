//! Single decision tree with cross-validated complexity.
//!
//! The collaborator controls tree complexity through a depth bound rather
//! than cost-complexity pruning to a leaf count. The contract is the same:
//! the complexity level is selected by k-fold cross-validation, not fixed.
use super::{PriceModel, kfold_indices, mse, to_matrix};
use crate::pipeline::split::Dataset;
use anyhow::{Context, Result, anyhow, ensure};
use log::{debug, info};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::tree::decision_tree_regressor::{
    DecisionTreeRegressor, DecisionTreeRegressorParameters,
};

/// A fitted regression tree at the cross-validation-selected depth.
///
/// Trees are scale-invariant, so this model consumes unscaled data.
pub struct TreeModel {
    inner: DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>,
    /// The selected depth bound
    pub max_depth: u16,
}

/// Fit a decision tree, choosing the depth from `depths` by k-fold
/// cross-validation minimizing mean validation MSE.
pub fn fit(train: &Dataset, depths: &[u16], folds: usize, seed: u64) -> Result<TreeModel> {
    ensure!(!depths.is_empty(), "tree needs at least one candidate depth");

    let fold_indices = kfold_indices(train.n_rows(), folds, seed);
    let mut best: Option<(u16, f64)> = None;
    for &depth in depths {
        let mut total = 0.0;
        for (fit_rows, validate_rows) in &fold_indices {
            let fit_fold = train.take_rows(fit_rows);
            let validate_fold = train.take_rows(validate_rows);

            let model = fit_at(&fit_fold, depth)?;
            let predicted = model
                .predict(&to_matrix(&validate_fold))
                .map_err(|e| anyhow!("tree prediction failed: {e}"))?;
            total += mse(&predicted, &validate_fold.target);
        }

        let mean_mse = total / fold_indices.len() as f64;
        debug!("tree depth {depth}: mean validation MSE {mean_mse}");
        if best.is_none_or(|(_, best_mse)| mean_mse < best_mse) {
            best = Some((depth, mean_mse));
        }
    }

    let (max_depth, _) = best.context("no depth candidate could be evaluated")?;
    info!("Selected tree depth {max_depth} by {folds}-fold cross-validation");

    let inner = fit_at(train, max_depth)?;
    Ok(TreeModel { inner, max_depth })
}

fn fit_at(
    train: &Dataset,
    depth: u16,
) -> Result<DecisionTreeRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>> {
    DecisionTreeRegressor::fit(
        &to_matrix(train),
        &train.target,
        DecisionTreeRegressorParameters::default().with_max_depth(depth),
    )
    .map_err(|e| anyhow!("tree training failed: {e}"))
}

impl PriceModel for TreeModel {
    fn name(&self) -> &'static str {
        "tree"
    }

    fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        self.inner
            .predict(&to_matrix(data))
            .map_err(|e| anyhow!("tree prediction failed: {e}"))
    }
}
