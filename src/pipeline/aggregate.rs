//! Aggregation of per-city weather tables into composite features.
use crate::error::StageError;
use crate::table::{Column, Table};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashMap;

/// How a weather field is combined across cities for one hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateRule {
    /// Average of the reporting cities
    Mean,
    /// Smallest value among the reporting cities
    Min,
    /// Largest value among the reporting cities
    Max,
}

/// The aggregation rule for a weather field.
///
/// Average conditions are representative for most variables, but temperature
/// extremes should reflect the most extreme city rather than a smoothed
/// average, to preserve the heat/cold spikes that correlate with demand
/// spikes.
pub fn rule_for(field: &str) -> AggregateRule {
    match field {
        "temp_min" => AggregateRule::Min,
        "temp_max" => AggregateRule::Max,
        _ => AggregateRule::Mean,
    }
}

impl AggregateRule {
    /// Combine the values reported by each city for one hour.
    ///
    /// Returns `None` only when no city reported a value.
    fn apply(self, values: impl Iterator<Item = f64>) -> Option<f64> {
        match self {
            Self::Mean => {
                let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| {
                    (sum + value, count + 1)
                });
                (count > 0).then(|| sum / count as f64)
            }
            Self::Min => values.reduce(f64::min),
            Self::Max => values.reduce(f64::max),
        }
    }
}

/// Merge the per-city tables into one composite weather table.
///
/// All city tables must cover an identical timestamp set (deduplication has
/// already run, so timestamps are unique within each table); any disagreement
/// is an [`StageError::Alignment`] failure, since misaligned rows cannot be
/// aggregated. Output rows follow the first city's timestamp order.
pub fn aggregate_cities(city_tables: &IndexMap<String, Table>) -> Result<Table> {
    let (first_city, reference) = city_tables
        .first()
        .context("cannot aggregate an empty set of city tables")?;
    let fields = reference.column_names().map(str::to_string).collect_vec();

    // Per-city row lookup by timestamp, with the alignment check
    let mut city_rows = Vec::with_capacity(city_tables.len());
    for (city, table) in city_tables {
        ensure!(
            table.column_names().collect_vec() == fields,
            "city {city:?} has a different column set to city {first_city:?}"
        );

        let rows: HashMap<&str, usize> = table
            .time()
            .iter()
            .enumerate()
            .map(|(row, time)| (time.as_str(), row))
            .collect();
        let found = reference
            .time()
            .iter()
            .filter(|time| rows.contains_key(time.as_str()))
            .count();
        if found != reference.n_rows() || table.n_rows() != reference.n_rows() {
            return Err(StageError::Alignment {
                city: city.clone(),
                expected: reference.n_rows(),
                found,
            }
            .into());
        }

        city_rows.push((table, rows));
    }

    let mut columns = IndexMap::new();
    for field in &fields {
        let rule = rule_for(field);
        let city_columns = city_rows
            .iter()
            .map(|(table, rows)| Ok((table.column(field)?, rows)))
            .collect::<Result<Vec<_>>>()?;

        let column: Column = reference
            .time()
            .iter()
            .map(|time| {
                let values = city_columns
                    .iter()
                    .filter_map(|(column, rows)| column[rows[time.as_str()]]);
                rule.apply(values)
            })
            .collect();
        columns.insert(field.clone(), column);
    }

    Table::new(reference.time().to_vec(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, table_from_rows};
    use float_cmp::assert_approx_eq;
    use indexmap::indexmap;
    use rstest::rstest;

    fn city(times: &[&str], temp_min: &[Option<f64>], temp: &[Option<f64>]) -> Table {
        table_from_rows(times, &[("temp", temp), ("temp_min", temp_min)])
    }

    #[rstest]
    #[case("temp", AggregateRule::Mean)]
    #[case("pressure", AggregateRule::Mean)]
    #[case("temp_min", AggregateRule::Min)]
    #[case("temp_max", AggregateRule::Max)]
    fn field_rules(#[case] field: &str, #[case] expected: AggregateRule) {
        assert_eq!(rule_for(field), expected);
    }

    /// The minimum-temperature aggregate must be the coldest city, not the mean
    #[rstest]
    fn min_temperature_takes_extreme() {
        let tables = indexmap! {
            "A".to_string() => city(&["t0"], &[Some(2.0)], &[Some(10.0)]),
            "B".to_string() => city(&["t0"], &[Some(-3.0)], &[Some(20.0)]),
            "C".to_string() => city(&["t0"], &[Some(0.5)], &[Some(30.0)]),
        };

        let aggregated = aggregate_cities(&tables).unwrap();
        assert_eq!(aggregated.column("temp_min").unwrap(), &[Some(-3.0)]);
        assert_approx_eq!(f64, aggregated.column("temp").unwrap()[0].unwrap(), 20.0);
    }

    #[rstest]
    fn mean_skips_missing_cities() {
        let tables = indexmap! {
            "A".to_string() => city(&["t0"], &[Some(1.0)], &[Some(10.0)]),
            "B".to_string() => city(&["t0"], &[Some(2.0)], &[None]),
        };

        let aggregated = aggregate_cities(&tables).unwrap();
        assert_approx_eq!(f64, aggregated.column("temp").unwrap()[0].unwrap(), 10.0);
    }

    #[rstest]
    fn all_missing_stays_missing() {
        let tables = indexmap! {
            "A".to_string() => city(&["t0"], &[Some(1.0)], &[None]),
            "B".to_string() => city(&["t0"], &[Some(2.0)], &[None]),
        };

        let aggregated = aggregate_cities(&tables).unwrap();
        assert_eq!(aggregated.column("temp").unwrap(), &[None]);
    }

    #[rstest]
    fn misaligned_city_is_fatal() {
        let tables = indexmap! {
            "A".to_string() => city(&["t0", "t1"], &[Some(1.0), Some(2.0)], &[Some(10.0), Some(11.0)]),
            "B".to_string() => city(&["t0", "t9"], &[Some(1.0), Some(2.0)], &[Some(10.0), Some(11.0)]),
        };

        assert_error!(
            aggregate_cities(&tables),
            "weather tables are misaligned: city B covers 1 timestamps, expected 2"
        );
    }

    #[rstest]
    fn output_follows_first_city_order() {
        let tables = indexmap! {
            "A".to_string() => city(&["t1", "t0"], &[Some(1.0), Some(2.0)], &[Some(10.0), Some(20.0)]),
            "B".to_string() => city(&["t0", "t1"], &[Some(3.0), Some(4.0)], &[Some(30.0), Some(40.0)]),
        };

        let aggregated = aggregate_cities(&tables).unwrap();
        assert_eq!(aggregated.time(), &["t1".to_string(), "t0".to_string()]);
        assert_approx_eq!(f64, aggregated.column("temp").unwrap()[0].unwrap(), 25.0);
        assert_approx_eq!(f64, aggregated.column("temp").unwrap()[1].unwrap(), 25.0);
    }
}
