#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loading of the joined economic census / population census table.
//!
//! The upstream ETL produces one columnar file with a row per area,
//! industry, and survey period. This crate reads it (Parquet through
//! `DuckDB`, or CSV), validates every row into an [`AreaRecord`], and keeps
//! the result as immutable process-wide state via [`global`].

pub mod columns;
mod csv_source;
pub mod normalize;
mod parquet_source;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use estat_density_area_models::AreaRecord;
use serde::Serialize;

pub use normalize::RowError;

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Reading the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV reader failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// `DuckDB` failed while reading a Parquet file.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// A required column is missing from the file.
    #[error("Missing required column '{column}' (available: {})", available.join(", "))]
    MissingColumn {
        /// Canonical name of the missing column.
        column: &'static str,
        /// Columns the file does have.
        available: Vec<String>,
    },

    /// The file extension is neither `.parquet` nor `.csv`.
    #[error("Unsupported dataset format: {}", path.display())]
    UnsupportedFormat {
        /// Path that was requested.
        path: PathBuf,
    },
}

/// Counts collected while loading a file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Data rows encountered.
    pub rows_read: usize,
    /// Rows that became records.
    pub rows_loaded: usize,
    /// Rows rejected as malformed.
    pub rows_rejected: usize,
    /// Count cells holding a suppression marker, loaded as zero.
    pub suppressed_cells: usize,
}

/// The loaded, validated dataset. Never mutated after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<AreaRecord>,
    periods: Vec<String>,
    report: LoadReport,
}

impl Dataset {
    /// Wraps already-validated records.
    #[must_use]
    pub fn from_records(records: Vec<AreaRecord>) -> Self {
        let report = LoadReport {
            rows_read: records.len(),
            rows_loaded: records.len(),
            ..LoadReport::default()
        };
        Self::with_report(records, report)
    }

    fn with_report(records: Vec<AreaRecord>, report: LoadReport) -> Self {
        let periods: BTreeSet<&str> = records.iter().map(|r| r.time_period.as_str()).collect();
        let periods = periods.into_iter().map(str::to_string).collect();
        Self {
            records,
            periods,
            report,
        }
    }

    /// All records in file order.
    #[must_use]
    pub fn records(&self) -> &[AreaRecord] {
        &self.records
    }

    /// Distinct survey periods, ascending.
    #[must_use]
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// The most recent survey period, if any rows were loaded.
    #[must_use]
    pub fn latest_period(&self) -> Option<&str> {
        self.periods.last().map(String::as_str)
    }

    /// Whether `period` occurs in the dataset.
    #[must_use]
    pub fn has_period(&self, period: &str) -> bool {
        self.periods.iter().any(|p| p == period)
    }

    /// Counts collected while loading.
    #[must_use]
    pub const fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no records were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads a dataset file, choosing the reader from the file extension.
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read, lacks a required
/// column, or is neither Parquet nor CSV. Individual
/// malformed rows are logged and counted, not treated as errors.
pub fn load(path: &Path) -> Result<Dataset, DatasetError> {
    log::info!("Loading dataset from {}", path.display());

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let (records, report) = match extension.as_deref() {
        Some("csv") => csv_source::read_path(path)?,
        Some("parquet") => parquet_source::read_path(path)?,
        _ => {
            return Err(DatasetError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }
    };

    let dataset = Dataset::with_report(records, report);
    log::info!(
        "Loaded {} rows ({} rejected, {} suppressed cells) across {} period(s)",
        report.rows_loaded,
        report.rows_rejected,
        report.suppressed_cells,
        dataset.periods().len()
    );

    Ok(dataset)
}

/// Reads CSV data from any reader (header row required).
///
/// # Errors
///
/// Returns [`DatasetError`] if the CSV is unreadable or lacks a required
/// column.
pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Dataset, DatasetError> {
    let (records, report) = csv_source::read(reader)?;
    Ok(Dataset::with_report(records, report))
}

static DATASET: OnceLock<Dataset> = OnceLock::new();

/// Returns the process-wide dataset, loading it from `path` on first use.
///
/// Later calls return the already-loaded dataset regardless of `path`.
/// Concurrent first calls may each read the file, but only one result is
/// kept and every caller observes the same instance.
///
/// # Errors
///
/// Returns [`DatasetError`] if the first load fails. A failed load leaves
/// the global unset so a later call can retry.
pub fn global(path: &Path) -> Result<&'static Dataset, DatasetError> {
    if let Some(dataset) = DATASET.get() {
        return Ok(dataset);
    }
    let loaded = load(path)?;
    Ok(DATASET.get_or_init(|| loaded))
}

#[cfg(test)]
mod tests {
    use estat_density_area_models::AreaCode;

    use super::*;

    const SAMPLE: &str = "\
area,areaName,sicCode,sicName,establishments,employees,population,@time
14100,横浜市,A,農業，林業,10,100,3700000,2014
14101,横浜市鶴見区,A,農業，林業,1,10,280000,2014
14101,横浜市鶴見区,B,漁業,-,5,280000,2014
1100,札幌市,A,農業，林業,3,30,1900000,2014
14X01,broken,A,農業，林業,1,1,1,2014
14102,横浜市神奈川区,A,農業，林業,2,20,240000,2012
";

    #[test]
    fn reads_csv() {
        let dataset = from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 5);
        assert_eq!(
            *dataset.report(),
            LoadReport {
                rows_read: 6,
                rows_loaded: 5,
                rows_rejected: 1,
                suppressed_cells: 1,
            }
        );
        assert_eq!(dataset.periods(), ["2012", "2014"]);
        assert_eq!(dataset.latest_period(), Some("2014"));
        assert!(dataset.has_period("2012"));
        assert!(!dataset.has_period("2020"));

        let sapporo = &dataset.records()[3];
        assert_eq!(sapporo.area_code, AreaCode::new("01100").unwrap());
        assert_eq!(sapporo.industry_name, "農業，林業");

        let suppressed = &dataset.records()[2];
        assert_eq!(suppressed.establishments, 0);
        assert_eq!(suppressed.employees, 5);
    }

    #[test]
    fn missing_required_column() {
        let err = from_csv_reader("area,sicCode,establishments,employees\n14101,A,1,2\n".as_bytes())
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn {
                column: "population",
                ..
            }
        ));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load(Path::new("data/census.xlsx")).unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat { .. }));
    }

    #[test]
    fn from_records_computes_periods() {
        let dataset = Dataset::from_records(Vec::new());
        assert!(dataset.is_empty());
        assert_eq!(dataset.latest_period(), None);
        assert_eq!(dataset.report().rows_loaded, 0);
    }
}
