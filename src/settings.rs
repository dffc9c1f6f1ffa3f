//! Code for loading program settings.
use crate::input::read_toml;
use crate::log::DEFAULT_LOG_LEVEL;
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Name of the optional settings file inside the data directory
pub const SETTINGS_FILE_NAME: &str = "analysis.toml";

/// Program settings, read from a TOML file in the data directory.
///
/// Any missing field takes its default value; a missing file means all
/// defaults. The defaults reproduce the reference analysis on the reference
/// data vintage.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// The default program log level
    pub log_level: String,
    /// Whether to overwrite output files by default
    pub overwrite: bool,
    /// The cities whose weather observations are aggregated
    pub cities: Vec<String>,
    /// Drop energy columns whose missing-value fraction exceeds this
    pub column_missing_threshold: f64,
    /// Abort if the fraction of incomplete energy rows exceeds this
    pub row_missing_threshold: f64,
    /// Whether schema mismatches (drop/rename/merge entries naming absent
    /// columns) abort the run instead of warning
    pub strict_schema: bool,
    /// Probability of assigning a row to the training set
    pub train_fraction: f64,
    /// Seed for the split, cross-validation shuffles and bootstrap sampling
    pub seed: u64,
    /// Number of cross-validation folds
    pub cv_folds: usize,
    /// Candidate regularization strengths for the penalized linear model
    pub lasso_alphas: Vec<f64>,
    /// Candidate depth bounds for the decision tree
    pub tree_depths: Vec<u16>,
    /// Number of bootstrap trees in the bagged ensemble
    pub n_trees: usize,
    /// Root path under which report folders are created
    pub results_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            overwrite: false,
            cities: ["Madrid", "Barcelona", "Valencia", "Sevilla", "Bilbao"]
                .map(String::from)
                .to_vec(),
            column_missing_threshold: 0.9,
            row_missing_threshold: 0.01,
            strict_schema: false,
            train_fraction: 0.7,
            seed: 123,
            cv_folds: 5,
            lasso_alphas: vec![0.001, 0.01, 0.1, 1.0, 10.0, 100.0],
            tree_depths: vec![2, 3, 4, 5, 6, 8, 10, 12],
            n_trees: 500,
            results_root: PathBuf::from("mercado_results"),
        }
    }
}

impl Settings {
    /// Read settings from the data directory, or defaults if no file exists
    pub fn load(data_dir: &Path) -> Result<Settings> {
        Self::load_from_path(&data_dir.join(SETTINGS_FILE_NAME))
    }

    /// Read from the specified path, falling back to defaults if absent
    pub fn load_from_path(file_path: &Path) -> Result<Settings> {
        let settings = if file_path.is_file() {
            read_toml(file_path)?
        } else {
            Settings::default()
        };
        settings.validate()?;

        Ok(settings)
    }

    /// Check numeric ranges and non-empty grids
    fn validate(&self) -> Result<()> {
        ensure!(!self.cities.is_empty(), "city list cannot be empty");
        ensure!(
            (0.0..=1.0).contains(&self.column_missing_threshold),
            "column_missing_threshold must be in [0, 1]"
        );
        ensure!(
            (0.0..=1.0).contains(&self.row_missing_threshold),
            "row_missing_threshold must be in [0, 1]"
        );
        ensure!(
            self.train_fraction > 0.0 && self.train_fraction < 1.0,
            "train_fraction must be in (0, 1)"
        );
        ensure!(self.cv_folds >= 2, "cv_folds must be at least 2");
        ensure!(!self.lasso_alphas.is_empty(), "lasso_alphas cannot be empty");
        ensure!(!self.tree_depths.is_empty(), "tree_depths cannot be empty");
        ensure!(self.n_trees > 0, "n_trees must be positive");
        self.log_level
            .parse::<log::LevelFilter>()
            .ok()
            .with_context(|| format!("invalid log level {:?}", self.log_level))?;

        Ok(())
    }
}
