//! The data-cleaning and fusion pipeline.
//!
//! Stages run strictly in order: load, deduplicate, split by city, prune
//! columns, filter rows, aggregate cities, fuse. Each stage consumes an
//! immutable table and produces a new one; no stage reads back from a later
//! one.
use crate::error::StageError;
use crate::input::energy::{ENERGY_FILE_NAME, read_energy_table};
use crate::input::weather::{WEATHER_FILE_NAME, city_table, read_weather_records, split_by_city};
use crate::settings::Settings;
use crate::table::Table;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use log::{info, warn};
use std::path::Path;

pub mod aggregate;
pub mod dedup;
pub mod fuse;
pub mod prune;
pub mod split;

use aggregate::aggregate_cities;
use dedup::dedup_by_time;
use fuse::fuse;
use prune::{drop_incomplete_rows, prune_constant_columns, prune_sparse_columns};

/// Columns of the weather source excluded from analysis.
///
/// Wind direction is redundant with wind speed for aggregate analysis and the
/// weather condition code is uninterpretable without an external codebook.
pub const WEATHER_DROP: &[&str] = &["wind_deg", "weather_id"];

/// Drop the named columns from a table.
///
/// A name which matches no column is a schema mismatch: fatal when `strict`
/// is set, otherwise reported as a warning and skipped. It is never silently
/// ignored, so an analysis cannot quietly operate on a different column set
/// than intended.
pub fn apply_drop_list(
    table: &Table,
    operation: &str,
    names: &[&str],
    strict: bool,
) -> Result<Table> {
    let mut table = table.clone();
    for name in names {
        if table.has_column(name) {
            table = table.without_column(name)?;
        } else {
            let err = StageError::schema_mismatch(operation, name);
            if strict {
                return Err(err.into());
            }
            warn!("{err}");
        }
    }

    Ok(table)
}

/// Rename columns according to an ordered raw-name/label mapping.
///
/// Mapping entries whose raw name is absent are subject to the same schema
/// mismatch policy as drops; on the reference data vintage every entry for a
/// surviving column matches, so a warning here signals either upstream
/// pruning or a changed source schema.
pub fn apply_renames(
    table: &Table,
    operation: &str,
    mapping: &[(&str, &str)],
    strict: bool,
) -> Result<Table> {
    let mut table = table.clone();
    for (from, to) in mapping {
        if table.has_column(from) {
            table = table.with_renamed_column(from, to)?;
        } else {
            let err = StageError::schema_mismatch(operation, from);
            if strict {
                return Err(err.into());
            }
            warn!("{err}");
        }
    }

    Ok(table)
}

/// Run the cleaning and fusion pipeline over the raw sources in `data_dir`.
///
/// Returns the fused analysis table, with the price as the last column.
pub fn load_and_fuse(data_dir: &Path, settings: &Settings) -> Result<Table> {
    // Stage 1: load both sources
    let energy = read_energy_table(&data_dir.join(ENERGY_FILE_NAME))
        .context("Failed to load energy table.")?;
    info!(
        "Loaded energy table: {} rows, {} columns",
        energy.n_rows(),
        energy.n_cols()
    );
    let weather = read_weather_records(&data_dir.join(WEATHER_FILE_NAME))
        .context("Failed to load weather observations.")?;
    info!("Loaded {} weather observations", weather.len());

    // Stages 2-4 (weather side): split by city, deduplicate, prune
    let by_city = split_by_city(weather, &settings.cities)?;
    let mut city_tables = IndexMap::new();
    for (city, records) in by_city {
        let records = dedup_by_time(&city, records);
        let table = city_table(&records)?;
        let table = apply_drop_list(&table, "weather drop list", WEATHER_DROP, settings.strict_schema)?;
        city_tables.insert(city, table);
    }

    // Stages 4-5 (energy side): prune columns, filter rows
    let energy = prune_sparse_columns(&energy, settings.column_missing_threshold)?;
    let energy = prune_constant_columns(&energy, &[])?;
    let energy = drop_incomplete_rows(&energy, settings.row_missing_threshold)?;

    // Stage 6: aggregate the five cities into composite weather features
    let weather = aggregate_cities(&city_tables)?;
    info!(
        "Aggregated weather table: {} rows, {} columns",
        weather.n_rows(),
        weather.n_cols()
    );

    // Stage 7: fuse into the analysis table
    let fused = fuse(&energy, &weather, settings.strict_schema)?;
    info!(
        "Fused analysis table: {} rows, {} columns",
        fused.n_rows(),
        fused.n_cols()
    );

    Ok(fused)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::table_from_rows;
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    #[fixture]
    fn table() -> Table {
        table_from_rows(
            &["t0"],
            &[("a", &[Some(1.0)]), ("b", &[Some(2.0)])],
        )
    }

    #[rstest]
    fn drop_list_lenient_skips_missing(table: Table) {
        let result = apply_drop_list(&table, "test", &["a", "nope"], false).unwrap();
        assert_eq!(result.column_names().collect_vec(), vec!["b"]);
    }

    #[rstest]
    fn drop_list_strict_fails_on_missing(table: Table) {
        assert!(apply_drop_list(&table, "test", &["a", "nope"], true).is_err());
    }

    #[rstest]
    fn renames_apply_in_order(table: Table) {
        let result =
            apply_renames(&table, "test", &[("a", "alpha"), ("b", "beta")], false).unwrap();
        assert_eq!(result.column_names().collect_vec(), vec!["alpha", "beta"]);
    }

    #[rstest]
    fn rename_strict_fails_on_missing(table: Table) {
        assert!(apply_renames(&table, "test", &[("nope", "x")], true).is_err());
    }
}
