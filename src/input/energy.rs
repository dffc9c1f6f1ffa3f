//! Code for reading the hourly generation/load/price table.
use super::{input_err_msg, parse_cell, source_read_error};
use crate::table::{Column, Table};
use anyhow::{Context, Result, ensure};
use csv::ReaderBuilder;
use indexmap::IndexMap;
use std::fs::File;
use std::path::Path;

/// File name of the energy source within the data directory
pub const ENERGY_FILE_NAME: &str = "energy_dataset.csv";

/// Read the hourly energy table from the specified CSV file.
///
/// The first column is treated as the timestamp key; every other column is
/// parsed as a nullable number.
pub fn read_energy_table(file_path: &Path) -> Result<Table> {
    let file = File::open(file_path)
        .map_err(|err| source_read_error(file_path, &err.to_string()))
        .with_context(|| input_err_msg(file_path))?;
    let mut reader = ReaderBuilder::new().from_reader(file);

    let headers = reader
        .headers()
        .with_context(|| input_err_msg(file_path))?
        .clone();
    ensure!(
        headers.len() >= 2,
        source_read_error(
            file_path,
            "expected a timestamp column and at least one data column"
        )
    );
    let names: Vec<String> = headers.iter().skip(1).map(|s| s.trim().to_string()).collect();

    let mut time = Vec::new();
    let mut columns: Vec<Column> = vec![Vec::new(); names.len()];
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| input_err_msg(file_path))?;

        time.push(record[0].trim().to_string());
        for (column, value) in columns.iter_mut().zip(record.iter().skip(1)) {
            let value = parse_cell(value)
                .with_context(|| format!("invalid number {value:?} at line {}", line + 2))?;
            column.push(value);
        }
    }

    ensure!(
        !time.is_empty(),
        source_read_error(file_path, "file contains no data rows")
    );

    let columns: IndexMap<String, Column> = names.into_iter().zip(columns).collect();
    Table::new(time, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write_and_read(contents: &str) -> Result<Table> {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(ENERGY_FILE_NAME);
        fs::write(&file_path, contents).unwrap();
        read_energy_table(&file_path)
    }

    #[test]
    fn reads_numbers_and_missing_cells() {
        let table =
            write_and_read("time,gen a,price\n2015-01-01 00:00,1.5,20\n2015-01-01 01:00,,21\n")
                .unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.column("gen a").unwrap(), &[Some(1.5), None]);
        assert_eq!(table.column("price").unwrap(), &[Some(20.0), Some(21.0)]);
    }

    #[test]
    fn fails_on_empty_file() {
        let err = write_and_read("time,gen a\n").unwrap_err();
        assert!(err.to_string().contains("file contains no data rows"));
    }

    #[test]
    fn fails_on_garbage_cell() {
        assert!(write_and_read("time,gen a\n2015-01-01 00:00,spam\n").is_err());
    }

    #[test]
    fn fails_on_missing_file() {
        let dir = tempdir().unwrap();
        assert!(read_energy_table(&dir.path().join(ENERGY_FILE_NAME)).is_err());
    }

    #[test]
    fn requires_a_data_column() {
        let err = write_and_read("time\n2015-01-01 00:00\n").unwrap_err();
        assert!(
            err.to_string()
                .contains("expected a timestamp column and at least one data column")
        );
    }
}
