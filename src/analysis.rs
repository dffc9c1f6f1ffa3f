//! Functionality for running the full analysis.
use crate::model::{
    FeatureImportance, PriceModel, VariableSubset, bagging, lasso, mse, permutation_importance,
    tree,
};
use crate::output::ReportWriter;
use crate::pipeline;
use crate::pipeline::fuse::TARGET_COLUMN;
use crate::pipeline::prune::prune_constant_columns;
use crate::pipeline::split::{Dataset, SplitTables, split, zscore};
use crate::settings::Settings;
use anyhow::{Context, Result};
use log::info;
use std::path::Path;

/// Run the analysis.
///
/// # Arguments:
///
/// * `data_dir` - Folder containing the two raw source files
/// * `settings` - Program settings
/// * `output_path` - The folder to which report files will be written
pub fn run(data_dir: &Path, settings: &Settings, output_path: &Path) -> Result<()> {
    // Clean and fuse the raw sources. The fused table can still carry
    // zero-variance weather aggregates, which the penalized linear model
    // cannot consume, so the variance rule is reapplied with the target
    // exempted.
    let fused = pipeline::load_and_fuse(data_dir, settings)?;
    let fused = prune_constant_columns(&fused, &[TARGET_COLUMN])?;

    // Partition into train and test
    let SplitTables { train, test } = split(&fused, settings.train_fraction, settings.seed);
    info!(
        "Split {} rows into {} train / {} test (p = {})",
        fused.n_rows(),
        train.n_rows(),
        test.n_rows(),
        settings.train_fraction
    );
    let train = Dataset::from_table(&train, TARGET_COLUMN)
        .context("building the training dataset")?;
    let test = Dataset::from_table(&test, TARGET_COLUMN).context("building the test dataset")?;

    let mut writer = ReportWriter::create(output_path)?;
    for subset in VariableSubset::ALL_SUBSETS {
        info!("=== Variable subset: {} ===", subset.label());
        let train = subset.filter(&train)?;
        let test = subset.filter(&test)?;

        // The penalized linear model needs scale-invariant features. Train
        // and test are scaled with their own statistics, as in the reference
        // analysis; the tree-based models consume the unscaled data.
        let scaled_train = zscore(&train);
        let scaled_test = zscore(&test);

        let model = lasso::fit(
            &scaled_train.data,
            &settings.lasso_alphas,
            settings.cv_folds,
            settings.seed,
        )?;
        let test_mse = mse(&model.predict(&scaled_test.data)?, &scaled_test.data.target);
        report(&mut writer, &model, subset, test_mse, &model.coefficient_importance())?;

        let model = tree::fit(&train, &settings.tree_depths, settings.cv_folds, settings.seed)?;
        let test_mse = mse(&model.predict(&test)?, &test.target);
        let importance = permutation_importance(&model, &test, settings.seed)?;
        report(&mut writer, &model, subset, test_mse, &importance)?;

        let model = bagging::fit(&train, settings.n_trees, settings.seed)?;
        let test_mse = mse(&model.predict(&test)?, &test.target);
        let importance = permutation_importance(&model, &test, settings.seed)?;
        report(&mut writer, &model, subset, test_mse, &importance)?;
    }

    writer.flush()?;
    Ok(())
}

/// Log and persist one (model, subset) result
fn report(
    writer: &mut ReportWriter,
    model: &dyn PriceModel,
    subset: VariableSubset,
    test_mse: f64,
    importance: &[FeatureImportance],
) -> Result<()> {
    info!("{} ({}): test MSE {test_mse:.4}", model.name(), subset.label());
    for (rank, feature) in importance.iter().enumerate() {
        info!(
            "  {}. {} ({:.4})",
            rank + 1,
            feature.feature,
            feature.importance
        );
    }

    writer.write_mse(model.name(), subset.label(), test_mse)?;
    writer.write_importance(model.name(), subset.label(), importance)?;

    Ok(())
}
