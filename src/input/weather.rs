//! Code for reading the hourly per-city weather observations.
use super::{input_err_msg, source_read_error};
use crate::table::{Column, Table};
use anyhow::{Context, Result, ensure};
use csv::{ReaderBuilder, StringRecord};
use indexmap::IndexMap;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

/// File name of the weather source within the data directory
pub const WEATHER_FILE_NAME: &str = "weather_features.csv";

/// The name assigned to the unlabeled first column of the weather source
pub const TIME_COLUMN_NAME: &str = "time";

/// One raw weather observation for a single city and hour.
///
/// The raw source contains duplicate (city, timestamp) pairs; uniqueness only
/// holds after deduplication.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawWeatherRecord {
    /// Timestamp of the observation
    pub time: String,
    /// City the observation belongs to
    pub city_name: String,
    /// Temperature
    pub temp: Option<f64>,
    /// Minimum temperature
    pub temp_min: Option<f64>,
    /// Maximum temperature
    pub temp_max: Option<f64>,
    /// Atmospheric pressure
    pub pressure: Option<f64>,
    /// Relative humidity
    pub humidity: Option<f64>,
    /// Wind speed
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees
    pub wind_deg: Option<f64>,
    /// Rain over the last hour
    pub rain_1h: Option<f64>,
    /// Rain over the last three hours
    pub rain_3h: Option<f64>,
    /// Snow over the last three hours
    pub snow_3h: Option<f64>,
    /// Cloud cover percentage
    pub clouds_all: Option<f64>,
    /// Numeric weather condition code
    pub weather_id: Option<f64>,
    /// Coarse weather category (e.g. "clear")
    pub weather_main: String,
    /// Weather description text
    pub weather_description: String,
    /// Weather icon identifier
    pub weather_icon: String,
}

/// The measured weather fields which can enter a numeric table.
///
/// The three descriptive text fields (`weather_main`, `weather_description`,
/// `weather_icon`) are uninterpretable without an external codebook and never
/// become columns.
pub const WEATHER_FIELDS: &[(&str, fn(&RawWeatherRecord) -> Option<f64>)] = &[
    ("temp", |r| r.temp),
    ("temp_min", |r| r.temp_min),
    ("temp_max", |r| r.temp_max),
    ("pressure", |r| r.pressure),
    ("humidity", |r| r.humidity),
    ("wind_speed", |r| r.wind_speed),
    ("wind_deg", |r| r.wind_deg),
    ("rain_1h", |r| r.rain_1h),
    ("rain_3h", |r| r.rain_3h),
    ("snow_3h", |r| r.snow_3h),
    ("clouds_all", |r| r.clouds_all),
    ("weather_id", |r| r.weather_id),
];

/// Read all weather observations from the specified CSV file.
///
/// The raw file's first column is unlabeled, so the header is rewritten to
/// name it before deserialization. City names are whitespace-trimmed (the raw
/// source contains padded variants of the same city).
pub fn read_weather_records(file_path: &Path) -> Result<Vec<RawWeatherRecord>> {
    let file = File::open(file_path)
        .map_err(|err| source_read_error(file_path, &err.to_string()))
        .with_context(|| input_err_msg(file_path))?;
    let mut reader = ReaderBuilder::new().from_reader(file);

    // Assign a name to the unlabeled timestamp column
    let headers = reader
        .headers()
        .with_context(|| input_err_msg(file_path))?
        .clone();
    ensure!(
        headers.len() > 1,
        source_read_error(file_path, "expected a timestamp column and weather columns")
    );
    let mut renamed = StringRecord::new();
    renamed.push_field(TIME_COLUMN_NAME);
    for field in headers.iter().skip(1) {
        renamed.push_field(field.trim());
    }
    reader.set_headers(renamed);

    let mut records = Vec::new();
    for record in reader.deserialize() {
        let mut record: RawWeatherRecord = record.with_context(|| input_err_msg(file_path))?;
        record.city_name = record.city_name.trim().to_string();
        records.push(record);
    }

    ensure!(
        !records.is_empty(),
        source_read_error(file_path, "file contains no data rows")
    );

    Ok(records)
}

/// Partition weather records by the configured city list.
///
/// Records for cities outside the list are discarded. A configured city with
/// no records at all is an error: its table could never cover the timestamp
/// domain.
pub fn split_by_city(
    records: Vec<RawWeatherRecord>,
    cities: &[String],
) -> Result<IndexMap<String, Vec<RawWeatherRecord>>> {
    let mut by_city: IndexMap<String, Vec<RawWeatherRecord>> = cities
        .iter()
        .map(|city| (city.clone(), Vec::new()))
        .collect();

    for record in records {
        if let Some(city_records) = by_city.get_mut(&record.city_name) {
            city_records.push(record);
        }
    }

    for (city, city_records) in &by_city {
        ensure!(
            !city_records.is_empty(),
            "no weather observations found for configured city {city:?}"
        );
    }

    Ok(by_city)
}

/// Build a numeric table from one city's (deduplicated) records
pub fn city_table(records: &[RawWeatherRecord]) -> Result<Table> {
    let time = records.iter().map(|r| r.time.clone()).collect();
    let columns: IndexMap<String, Column> = WEATHER_FIELDS
        .iter()
        .map(|(name, get)| {
            let column = records.iter().map(get).collect();
            (name.to_string(), column)
        })
        .collect();

    Table::new(time, columns)
}
