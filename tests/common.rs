//! Common code for building synthetic datasets for integration tests.
#![allow(dead_code)] // NB: each test binary uses a different subset of this module
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Cities used by the synthetic weather file
pub const CITIES: [&str; 3] = ["Madrid", "Barcelona", "Valencia"];

/// The synthetic hourly price
pub fn price(hour: usize) -> f64 {
    30.0 + 0.02 * solar(hour) + 0.5 * (hour % 5) as f64
}

fn solar(hour: usize) -> f64 {
    1000.0 + ((hour * 13) % 17) as f64 * 50.0
}

/// Write a synthetic energy file, weather file and settings file to `dir`.
///
/// The energy file contains `n_hours` rows including one incomplete row
/// (hour 5), a constant column and an entirely missing column; the weather
/// file covers a superset of the energy timestamps for each city and contains
/// one duplicated (city, timestamp) pair.
pub fn write_dataset(dir: &Path, n_hours: usize) {
    let mut energy = String::from(
        "time,generation biomass,generation fossil brown coal/lignite,generation fossil gas,\
         generation fossil hard coal,generation fossil peat,generation marine,\
         generation hydro water reservoir,generation nuclear,generation other,\
         generation other renewable,generation solar,generation wind onshore,\
         total load actual,price day ahead,price actual\n",
    );
    for hour in 0..n_hours {
        let biomass = if hour == 5 {
            String::new() // the one incomplete row
        } else {
            format!("{}", 400.0 + (hour % 7) as f64 * 10.0)
        };
        writeln!(
            energy,
            "{},{biomass},{},{},{},0,,{},{},{},{},{},{},{},{},{}",
            time(hour),
            300.0 + (hour % 5) as f64 * 20.0,  // brown coal
            4000.0 + (hour % 9) as f64 * 30.0, // gas
            500.0 + (hour % 11) as f64 * 5.0,  // hard coal
            2500.0 + (hour % 13) as f64 * 30.0,
            7000.0 + (hour % 3) as f64 * 100.0,
            60.0 + (hour % 2) as f64 * 10.0,
            80.0 + (hour % 4) as f64 * 5.0,
            solar(hour),
            3000.0 + ((hour * 7) % 23) as f64 * 40.0,
            25000.0 + (hour % 9) as f64 * 200.0,
            price(hour) - 2.0,
            price(hour),
        )
        .unwrap();
    }
    fs::write(dir.join("energy_dataset.csv"), energy).unwrap();

    let mut weather = String::from(
        ",city_name,temp,temp_min,temp_max,pressure,humidity,wind_speed,wind_deg,rain_1h,\
         rain_3h,snow_3h,clouds_all,weather_id,weather_main,weather_description,weather_icon\n",
    );
    for (city_index, city) in CITIES.iter().enumerate() {
        // Weather coverage is a strict superset of the energy domain
        for hour in 0..n_hours + 5 {
            let temp = 280.0 + city_index as f64 * 2.0 + (hour % 24) as f64 * 0.5;
            weather_row(&mut weather, hour, city, temp);
            if city_index == 0 && hour == 0 {
                // Duplicate observation; deduplication must keep the first
                weather_row(&mut weather, hour, city, 999.0);
            }
        }
    }
    fs::write(dir.join("weather_features.csv"), weather).unwrap();

    fs::write(
        dir.join("analysis.toml"),
        "cities = [\"Madrid\", \"Barcelona\", \"Valencia\"]\n\
         n_trees = 20\n\
         tree_depths = [2, 3, 4]\n\
         lasso_alphas = [0.01, 0.1]\n\
         cv_folds = 3\n",
    )
    .unwrap();
}

/// The timestamp key for a synthetic hour
pub fn time(hour: usize) -> String {
    format!("2015-01-01 {hour:04}")
}

fn weather_row(out: &mut String, hour: usize, city: &str, temp: f64) {
    writeln!(
        out,
        "{},{city},{temp},{},{},1013,70,{},180,0,{},0,{},800,clear,sky is clear,01n",
        time(hour),
        temp - 5.0,
        temp + 5.0,
        2.0 + (hour % 6) as f64,
        (hour % 3) as f64 * 0.1,
        (hour % 10) as f64 * 10.0,
    )
    .unwrap();
}
