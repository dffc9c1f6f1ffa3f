//! Removal of duplicate weather observations.
use crate::input::weather::RawWeatherRecord;
use log::info;
use std::collections::HashSet;

/// Remove duplicate-timestamp observations from one city's records.
///
/// The raw source contains verified duplicate (city, timestamp) collisions.
/// The first record encountered for each timestamp is kept; the original
/// analysis leaves the choice among duplicates unspecified, so the policy is
/// documented here to avoid silent divergence. Applying this twice yields the
/// same result as applying it once.
pub fn dedup_by_time(city: &str, records: Vec<RawWeatherRecord>) -> Vec<RawWeatherRecord> {
    let total = records.len();
    let mut seen = HashSet::with_capacity(total);
    let records: Vec<_> = records
        .into_iter()
        .filter(|record| seen.insert(record.time.clone()))
        .collect();

    let dropped = total - records.len();
    if dropped > 0 {
        info!("{city}: dropped {dropped} duplicate observations ({total} total)");
    }

    records
}
