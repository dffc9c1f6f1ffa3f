//! Threshold-driven column pruning and row filtering.
//!
//! The reference analysis drops specific columns discovered by one-off
//! inspection of one dataset vintage; here the underlying rules (missingness
//! threshold, zero variance) are encoded instead, so the pipeline reproduces
//! the same drops against a refreshed dataset.
use crate::error::StageError;
use crate::table::Table;
use anyhow::Result;
use itertools::Itertools;
use log::info;

/// Drop columns whose missing-value fraction exceeds `threshold`
pub fn prune_sparse_columns(table: &Table, threshold: f64) -> Result<Table> {
    let sparse = table
        .column_names()
        .map(str::to_string)
        .collect_vec()
        .into_iter()
        .filter_map(|name| {
            let fraction = table.missing_fraction(&name).ok()?;
            (fraction > threshold).then_some(name)
        })
        .collect_vec();

    let mut table = table.clone();
    for name in &sparse {
        info!("Dropping near-empty column {name:?}");
        table = table.without_column(name)?;
    }

    Ok(table)
}

/// Drop columns whose sample standard deviation is exactly zero.
///
/// Constant columns carry no inferential value, and the penalized linear
/// collaborator rejects them outright. Columns named in `exempt` are kept
/// whatever their variance; columns with fewer than two present values are
/// left alone (the sparse-column rule handles those).
pub fn prune_constant_columns(table: &Table, exempt: &[&str]) -> Result<Table> {
    let constant = table
        .column_names()
        .filter(|name| !exempt.contains(name))
        .map(str::to_string)
        .collect_vec()
        .into_iter()
        .filter_map(|name| {
            let std = table.sample_std(&name).ok()??;
            (std == 0.0).then_some(name)
        })
        .collect_vec();

    let mut table = table.clone();
    for name in &constant {
        info!("Dropping zero-variance column {name:?}");
        table = table.without_column(name)?;
    }

    Ok(table)
}

/// Drop rows containing any missing value, provided there are few of them.
///
/// Fails with [`StageError::ExcessiveMissingness`] if the affected-row
/// fraction exceeds `threshold`: dropping a large share of the data should be
/// an explicit decision (e.g. plugging in an imputation step), never a silent
/// one.
pub fn drop_incomplete_rows(table: &Table, threshold: f64) -> Result<Table> {
    let count = table.incomplete_row_count();
    let fraction = if table.n_rows() == 0 {
        0.0
    } else {
        count as f64 / table.n_rows() as f64
    };
    if fraction > threshold {
        return Err(StageError::ExcessiveMissingness {
            stage: "row filter",
            fraction,
            threshold,
            count,
        }
        .into());
    }

    let (filtered, dropped) = table.filter_complete_rows();
    if dropped > 0 {
        info!(
            "Dropped {dropped} incomplete rows ({:.3}% of {})",
            fraction * 100.0,
            table.n_rows()
        );
    }

    Ok(filtered)
}
