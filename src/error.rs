//! Error taxonomy for the analysis pipeline.
//!
//! Every failure is terminal for the run: this is a deterministic batch
//! pipeline over static files, so there is no retry logic anywhere. Errors
//! are wrapped in `anyhow` chains at call sites to add stage context.
use std::path::PathBuf;
use thiserror::Error;

/// A fatal error raised by one of the pipeline stages.
#[derive(Debug, Error)]
pub enum StageError {
    /// An input file is absent, malformed or empty
    #[error("cannot read source file {path}: {reason}")]
    SourceRead {
        /// Path of the offending file
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// The per-city weather tables disagree on their timestamp domain
    #[error(
        "weather tables are misaligned: city {city} covers {found} timestamps, expected {expected}"
    )]
    Alignment {
        /// The city whose table disagrees with the first one
        city: String,
        /// Number of timestamps in the reference table
        expected: usize,
        /// Number of matching timestamps found for this city
        found: usize,
    },

    /// Row- or column-level missingness exceeds the configured threshold
    #[error(
        "{stage}: missing-value fraction {fraction:.4} exceeds threshold {threshold:.4} \
         ({count} rows affected)"
    )]
    ExcessiveMissingness {
        /// Name of the stage which detected the problem
        stage: &'static str,
        /// Observed missing fraction
        fraction: f64,
        /// Configured maximum
        threshold: f64,
        /// Number of affected rows
        count: usize,
    },

    /// A configured drop/rename/merge step references a column that does not exist
    #[error("{operation}: no column named {column:?} in the current table")]
    SchemaMismatch {
        /// The operation that referenced the missing column
        operation: String,
        /// The missing column name
        column: String,
    },
}

impl StageError {
    /// Convenience constructor for schema mismatches
    pub fn schema_mismatch(operation: &str, column: &str) -> Self {
        Self::SchemaMismatch {
            operation: operation.to_string(),
            column: column.to_string(),
        }
    }
}
