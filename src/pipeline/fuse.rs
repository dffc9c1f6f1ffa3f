//! Fusion of the cleaned energy table with the aggregated weather table.
use super::{apply_drop_list, apply_renames};
use crate::error::StageError;
use crate::table::Table;
use anyhow::{Context, Result, ensure};
use log::warn;

/// The target column of the analysis, always moved to the last position
pub const TARGET_COLUMN: &str = "Price";

/// Human-readable labels for the energy columns, in source order
pub const ENERGY_LABELS: &[(&str, &str)] = &[
    ("generation biomass", "Biomass"),
    ("generation fossil brown coal/lignite", "Brown coal"),
    ("generation fossil gas", "Gas"),
    ("generation fossil hard coal", "Hard coal"),
    ("generation fossil oil", "Oil"),
    ("generation hydro pumped storage consumption", "Hydro Pumped"),
    ("generation hydro run-of-river and poundage", "Hydro River"),
    ("generation hydro water reservoir", "Hydro Reservoir"),
    ("generation nuclear", "Nuclear"),
    ("generation other", "Other"),
    ("generation other renewable", "Other Renewable"),
    ("generation solar", "Solar"),
    ("generation waste", "Waste"),
    ("generation wind onshore", "Wind"),
    ("forecast solar day ahead", "Forecast Solar"),
    ("forecast wind onshore day ahead", "Forecast Wind"),
    ("total load forecast", "Total Load Forecast"),
    ("total load actual", "Total Load"),
    ("price day ahead", "Price Forecast"),
    ("price actual", "Price"),
];

/// Human-readable labels for the aggregated weather columns, in source order
pub const WEATHER_LABELS: &[(&str, &str)] = &[
    ("temp", "Avg. Temp"),
    ("temp_min", "Min Temp"),
    ("temp_max", "Max Temp"),
    ("pressure", "Pressure"),
    ("humidity", "Humidity"),
    ("wind_speed", "Wind Speed"),
    ("rain_1h", "Rain1h"),
    ("rain_3h", "Rain3h"),
    ("snow_3h", "Snow"),
    ("clouds_all", "Clouds"),
];

/// Forecast-derived columns dropped after renaming.
///
/// NB: the "Rain 1h" entry is carried over verbatim from the reference
/// analysis and matches no renamed column (the rain column is labelled
/// "Rain1h", without the space). It looks like an unintentional no-op drop in
/// the original; it is surfaced as a schema mismatch rather than guessed at.
pub const FORECAST_DROP: &[&str] = &[
    "Forecast Solar",
    "Forecast Wind",
    "Total Load Forecast",
    "Price Forecast",
    "Rain 1h",
];

/// The weather-feature labels of the fused table (everything else except the
/// price is a production feature)
pub const WEATHER_FEATURE_LABELS: &[&str] = &[
    "Avg. Temp",
    "Min Temp",
    "Max Temp",
    "Pressure",
    "Humidity",
    "Wind Speed",
    "Rain1h",
    "Rain3h",
    "Snow",
    "Clouds",
];

/// Fuse the cleaned energy table with the aggregated weather table.
///
/// Steps, in order: inner-join on timestamp (the energy table's domain is the
/// join target; weather coverage is a superset), rename to human-readable
/// labels, drop forecast-derived columns, merge the two coal sources and the
/// two "other" sources, drop the total load, and move the price to the last
/// position so downstream split logic has a fixed target index.
///
/// Total load is dropped as an analysis choice, not a data-quality fix: it is
/// a demand proxy collinear with the price, and its presence would dominate
/// inference of the production/weather effects.
pub fn fuse(energy: &Table, weather: &Table, strict: bool) -> Result<Table> {
    let fused = energy
        .inner_join(weather)
        .context("joining energy and weather tables")?;
    ensure!(
        fused.n_rows() > 0,
        "energy and weather tables share no timestamps"
    );

    let fused = apply_renames(&fused, "energy labels", ENERGY_LABELS, strict)?;
    let fused = apply_renames(&fused, "weather labels", WEATHER_LABELS, strict)?;

    let fused = apply_drop_list(&fused, "forecast drop list", FORECAST_DROP, strict)?;

    let fused = merge_pair(&fused, "Brown coal", "Hard coal", "Coal", strict)?;
    let fused = merge_pair(&fused, "Other", "Other Renewable", "Others", strict)?;

    let fused = apply_drop_list(&fused, "demand proxy drop", &["Total Load"], strict)?;

    // The target must exist whatever the schema policy says
    ensure!(
        fused.has_column(TARGET_COLUMN),
        StageError::schema_mismatch("target relocation", TARGET_COLUMN)
    );
    fused.with_column_last(TARGET_COLUMN)
}

/// Sum-merge two generation columns into one, dropping both inputs.
///
/// Missing inputs follow the schema mismatch policy: fatal when strict,
/// otherwise the merge is skipped with a warning.
fn merge_pair(table: &Table, first: &str, second: &str, name: &str, strict: bool) -> Result<Table> {
    for input in [first, second] {
        if !table.has_column(input) {
            let err = StageError::schema_mismatch(&format!("merge into {name:?}"), input);
            if strict {
                return Err(err.into());
            }
            warn!("{err}");
            return Ok(table.clone());
        }
    }

    table.with_summed_pair(first, second, name)
}
