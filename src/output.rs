//! Code for writing report files to the output directory.
use crate::model::FeatureImportance;
use anyhow::{Context, Result, ensure};
use csv::Writer;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// The output filename for per-model test errors
const MSE_FILE_NAME: &str = "mse.csv";

/// The output filename for ranked feature importances
const IMPORTANCE_FILE_NAME: &str = "importance.csv";

/// Get the default path to the output folder for the given data directory
pub fn get_output_dir(data_dir: &Path, results_root: PathBuf) -> Result<PathBuf> {
    // Get the data directory name
    let data_dir = data_dir.canonicalize().context("Could not resolve path to data directory")?;
    let name = data_dir
        .file_name()
        .context("Data directory cannot be a root path")?;

    Ok(results_root.join(name))
}

/// Create a directory for output files.
///
/// Returns whether an existing directory was overwritten. Refuses to clobber
/// a non-empty directory unless `overwrite` is set.
pub fn create_output_directory(output_path: &Path, overwrite: bool) -> Result<bool> {
    let existing = output_path.exists() && fs::read_dir(output_path)?.next().is_some();
    if existing {
        ensure!(
            overwrite,
            "Output directory {} already exists. Use --overwrite to replace it.",
            output_path.display()
        );
        fs::remove_dir_all(output_path)?;
    }
    fs::create_dir_all(output_path)?;

    Ok(existing)
}

/// An object for writing analysis reports to CSV files
pub struct ReportWriter {
    mse_writer: Writer<File>,
    importance_writer: Writer<File>,
}

impl ReportWriter {
    /// Open the report files in the specified output directory
    pub fn create(output_path: &Path) -> Result<Self> {
        let mse_path = output_path.join(MSE_FILE_NAME);
        let mut mse_writer = Writer::from_path(&mse_path)
            .with_context(|| format!("Could not create {}", mse_path.display()))?;
        mse_writer.write_record(["model", "subset", "mse"])?;

        let importance_path = output_path.join(IMPORTANCE_FILE_NAME);
        let mut importance_writer = Writer::from_path(&importance_path)
            .with_context(|| format!("Could not create {}", importance_path.display()))?;
        importance_writer.write_record(["model", "subset", "rank", "feature", "importance"])?;

        Ok(Self {
            mse_writer,
            importance_writer,
        })
    }

    /// Write the test MSE for one (model, subset) combination
    pub fn write_mse(&mut self, model: &str, subset: &str, mse: f64) -> Result<()> {
        self.mse_writer
            .write_record([model, subset, &mse.to_string()])?;

        Ok(())
    }

    /// Write a ranked importance list for one (model, subset) combination
    pub fn write_importance(
        &mut self,
        model: &str,
        subset: &str,
        importance: &[FeatureImportance],
    ) -> Result<()> {
        for (rank, feature) in importance.iter().enumerate() {
            self.importance_writer.write_record([
                model,
                subset,
                &(rank + 1).to_string(),
                &feature.feature,
                &feature.importance.to_string(),
            ])?;
        }

        Ok(())
    }

    /// Flush the underlying writers
    pub fn flush(&mut self) -> Result<()> {
        self.mse_writer.flush()?;
        self.importance_writer.flush()?;

        Ok(())
    }
}
