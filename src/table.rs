//! The tabular value type passed between pipeline stages.
//!
//! A [`Table`] is a set of named nullable numeric columns plus a parallel
//! vector of timestamp keys. Every stage of the pipeline consumes a table and
//! produces a new one; nothing is mutated in place after creation, which keeps
//! each stage independently testable.
use crate::error::StageError;
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashMap;

/// A nullable numeric column
pub type Column = Vec<Option<f64>>;

/// An immutable table of named numeric columns keyed by timestamp.
///
/// The timestamp vector is not itself a column: it is carried alongside the
/// data for deduplication and joins, and never enters the model feature set.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    time: Vec<String>,
    columns: IndexMap<String, Column>,
}

impl Table {
    /// Create a table from a timestamp vector and named columns.
    ///
    /// Fails if any column's length differs from the timestamp vector's.
    pub fn new(time: Vec<String>, columns: IndexMap<String, Column>) -> Result<Self> {
        for (name, column) in &columns {
            ensure!(
                column.len() == time.len(),
                "column {name:?} has {} rows but the table has {} timestamps",
                column.len(),
                time.len()
            );
        }

        Ok(Self { time, columns })
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.time.len()
    }

    /// Number of data columns (excluding the timestamp key)
    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// The timestamp keys, in row order
    pub fn time(&self) -> &[String] {
        &self.time
    }

    /// Column names in table order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Whether a column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name
    pub fn column(&self, name: &str) -> Result<&[Option<f64>]> {
        let column = self
            .columns
            .get(name)
            .ok_or_else(|| StageError::schema_mismatch("column lookup", name))?;

        Ok(column)
    }

    /// Fraction of missing values in the named column
    pub fn missing_fraction(&self, name: &str) -> Result<f64> {
        let column = self.column(name)?;
        if column.is_empty() {
            return Ok(0.0);
        }

        let missing = column.iter().filter(|v| v.is_none()).count();
        Ok(missing as f64 / column.len() as f64)
    }

    /// Sample standard deviation of the present values in the named column.
    ///
    /// Returns `None` if fewer than two values are present.
    pub fn sample_std(&self, name: &str) -> Result<Option<f64>> {
        let values = self
            .column(name)?
            .iter()
            .filter_map(|v| *v)
            .collect::<Vec<_>>();
        if values.len() < 2 {
            return Ok(None);
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Ok(Some(var.sqrt()))
    }

    /// Return a copy of the table without the named column
    pub fn without_column(&self, name: &str) -> Result<Self> {
        ensure!(
            self.has_column(name),
            StageError::schema_mismatch("drop column", name)
        );

        let columns = self
            .columns
            .iter()
            .filter(|(key, _)| key.as_str() != name)
            .map(|(key, column)| (key.clone(), column.clone()))
            .collect();
        Ok(Self {
            time: self.time.clone(),
            columns,
        })
    }

    /// Return a copy of the table with a single column renamed, preserving order
    pub fn with_renamed_column(&self, from: &str, to: &str) -> Result<Self> {
        ensure!(
            self.has_column(from),
            StageError::schema_mismatch("rename column", from)
        );
        ensure!(
            !self.has_column(to),
            "cannot rename {from:?} to {to:?}: target name already exists"
        );

        let columns = self
            .columns
            .iter()
            .map(|(key, column)| {
                let key = if key == from { to.to_string() } else { key.clone() };
                (key, column.clone())
            })
            .collect();
        Ok(Self {
            time: self.time.clone(),
            columns,
        })
    }

    /// Replace two columns by their row-wise sum, appended as a new column.
    ///
    /// A row's sum is missing if either input value is missing.
    pub fn with_summed_pair(&self, first: &str, second: &str, name: &str) -> Result<Self> {
        let a = self.column(first).context("merging column pair")?;
        let b = self.column(second).context("merging column pair")?;
        let summed = a
            .iter()
            .zip(b)
            .map(|(a, b)| Some(a.as_ref()? + b.as_ref()?))
            .collect();

        let mut table = self.without_column(first)?.without_column(second)?;
        table.columns.insert(name.to_string(), summed);
        Ok(table)
    }

    /// Return a copy of the table with the named column moved to the last position
    pub fn with_column_last(&self, name: &str) -> Result<Self> {
        ensure!(
            self.has_column(name),
            StageError::schema_mismatch("move column", name)
        );

        let mut table = self.clone();
        let column = table.columns.shift_remove(name).unwrap();
        table.columns.insert(name.to_string(), column);
        Ok(table)
    }

    /// Inner-join this table with another on the timestamp key.
    ///
    /// The output contains one row per timestamp of `self` which also appears
    /// in `other`, in `self`'s row order, with `self`'s columns followed by
    /// `other`'s columns.
    pub fn inner_join(&self, other: &Self) -> Result<Self> {
        if let Some(name) = self.column_names().find(|name| other.has_column(name)) {
            anyhow::bail!("cannot join tables: both sides have a column named {name:?}");
        }

        let other_rows: HashMap<&str, usize> = other
            .time
            .iter()
            .enumerate()
            .map(|(row, time)| (time.as_str(), row))
            .collect();

        // Row indices of the join, per side
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = self
            .time
            .iter()
            .enumerate()
            .filter_map(|(row, time)| Some((row, *other_rows.get(time.as_str())?)))
            .unzip();

        let time = left_rows.iter().map(|&row| self.time[row].clone()).collect();
        let mut columns: IndexMap<String, Column> = self
            .columns
            .iter()
            .map(|(name, column)| {
                let column = left_rows.iter().map(|&row| column[row]).collect();
                (name.clone(), column)
            })
            .collect();
        for (name, column) in &other.columns {
            let column = right_rows.iter().map(|&row| column[row]).collect();
            columns.insert(name.clone(), column);
        }

        Ok(Self { time, columns })
    }

    /// Return a copy containing only the rows at the given indices
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let time = rows.iter().map(|&row| self.time[row].clone()).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let column = rows.iter().map(|&row| column[row]).collect();
                (name.clone(), column)
            })
            .collect();
        Self { time, columns }
    }

    /// Drop every row containing at least one missing value.
    ///
    /// Returns the filtered table and the number of rows dropped.
    pub fn filter_complete_rows(&self) -> (Self, usize) {
        let keep = (0..self.n_rows())
            .filter(|&row| self.columns.values().all(|column| column[row].is_some()))
            .collect_vec();
        let dropped = self.n_rows() - keep.len();

        (self.select_rows(&keep), dropped)
    }

    /// Number of rows with at least one missing value
    pub fn incomplete_row_count(&self) -> usize {
        (0..self.n_rows())
            .filter(|&row| self.columns.values().any(|column| column[row].is_none()))
            .count()
    }
}
