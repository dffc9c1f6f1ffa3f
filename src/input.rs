//! Code for reading the two raw data sources.
use crate::error::StageError;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

pub mod energy;
pub mod weather;

/// Standard error message for a problem reading a file
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Construct a [`StageError::SourceRead`] for the given file
pub(crate) fn source_read_error(file_path: &Path, reason: &str) -> StageError {
    StageError::SourceRead {
        path: file_path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Parse a TOML file into the specified type
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;

    Ok(toml_data)
}

/// Parse a cell of a CSV file as a nullable number.
///
/// Empty or whitespace-only cells represent missing values.
pub(crate) fn parse_cell(value: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value.parse().map(Some)
}
