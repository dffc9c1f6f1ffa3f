//! Fixtures for tests
use crate::input::weather::RawWeatherRecord;
use crate::pipeline::split::Dataset;
use crate::table::{Column, Table};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Build a table from timestamps and named columns
pub(crate) fn table_from_rows(time: &[&str], columns: &[(&str, &[Option<f64>])]) -> Table {
    let time = time.iter().map(|s| s.to_string()).collect();
    let columns: IndexMap<String, Column> = columns
        .iter()
        .map(|(name, values)| (name.to_string(), values.to_vec()))
        .collect();

    Table::new(time, columns).unwrap()
}

/// A weather observation with plausible values derived from the temperature
pub(crate) fn weather_record(time: &str, city: &str, temp: f64) -> RawWeatherRecord {
    RawWeatherRecord {
        time: time.to_string(),
        city_name: city.to_string(),
        temp: Some(temp),
        temp_min: Some(temp - 5.0),
        temp_max: Some(temp + 5.0),
        pressure: Some(1013.0),
        humidity: Some(70.0),
        wind_speed: Some(3.0),
        wind_deg: Some(180.0),
        rain_1h: Some(0.0),
        rain_3h: Some(0.0),
        snow_3h: Some(0.0),
        clouds_all: Some(20.0),
        weather_id: Some(800.0),
        weather_main: "clear".to_string(),
        weather_description: "sky is clear".to_string(),
        weather_icon: "01n".to_string(),
    }
}

/// A dataset whose target is an exact linear combination of its features.
///
/// Features are drawn from a seeded RNG so every column varies; the target
/// is `sum(coefficients[j] * x[j])` with no noise.
pub(crate) fn linear_dataset(n_rows: usize, coefficients: &[f64]) -> Dataset {
    let mut rng = StdRng::seed_from_u64(17);
    let feature_names = (0..coefficients.len()).map(|j| format!("x{j}")).collect();
    let rows: Vec<Vec<f64>> = (0..n_rows)
        .map(|_| {
            (0..coefficients.len())
                .map(|_| rng.gen_range(0.0..10.0))
                .collect()
        })
        .collect();
    let target = rows
        .iter()
        .map(|row| {
            row.iter()
                .zip(coefficients)
                .map(|(x, c)| x * c)
                .sum()
        })
        .collect();

    Dataset {
        feature_names,
        rows,
        target,
    }
}
