//! Row validation shared by the CSV and Parquet readers.

use estat_density_area_models::{AreaCode, AreaCodeError, AreaRecord};

use crate::LoadReport;

/// Cell values e-Stat uses for suppressed or unavailable counts.
const SUPPRESSION_MARKERS: &[&str] = &["", "-", "…", "...", "***", "x", "X"];

/// Largest float that still converts to an exact integer count.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("row {row}: malformed area code '{raw}': {source}")]
    MalformedAreaCode {
        row: usize,
        raw: String,
        source: AreaCodeError,
    },

    #[error("row {row}: missing industry code")]
    MissingIndustryCode { row: usize },

    #[error("row {row}: invalid {column} count '{raw}'")]
    InvalidCount {
        row: usize,
        column: &'static str,
        raw: String,
    },
}

/// One row as read from the file, before validation. `None` cells are
/// SQL `NULL`s.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRow<'r> {
    /// 1-based data row number, for diagnostics.
    pub index: usize,
    pub area: Option<&'r str>,
    pub area_name: Option<&'r str>,
    pub industry_code: Option<&'r str>,
    pub industry_name: Option<&'r str>,
    pub establishments: Option<&'r str>,
    pub employees: Option<&'r str>,
    pub population: Option<&'r str>,
    pub time_period: Option<&'r str>,
}

/// A parsed count and whether the cell held a suppression marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Count {
    pub value: u64,
    pub suppressed: bool,
}

/// Parses a count cell.
///
/// Suppression markers and `NULL` load as zero. Integral floats (`"12.0"`,
/// as written by some Parquet exports) are accepted. Thousands separators
/// are ignored.
///
/// # Errors
///
/// Returns [`RowError::InvalidCount`] for negative, fractional, or
/// non-numeric values.
pub fn parse_count(row: usize, column: &'static str, raw: Option<&str>) -> Result<Count, RowError> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(Count {
            value: 0,
            suppressed: true,
        });
    };
    if SUPPRESSION_MARKERS.contains(&raw) {
        return Ok(Count {
            value: 0,
            suppressed: true,
        });
    }

    let invalid = || RowError::InvalidCount {
        row,
        column,
        raw: raw.to_string(),
    };

    let digits = raw.replace(',', "");
    if let Ok(value) = digits.parse::<u64>() {
        return Ok(Count {
            value,
            suppressed: false,
        });
    }

    let float: f64 = digits.parse().map_err(|_| invalid())?;
    if !float.is_finite() || float < 0.0 || float.fract() != 0.0 || float > MAX_EXACT_COUNT {
        return Err(invalid());
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = float as u64;
    Ok(Count {
        value,
        suppressed: false,
    })
}

/// Validates one raw row into an [`AreaRecord`].
///
/// Returns the record and the number of suppressed count cells.
///
/// # Errors
///
/// Returns [`RowError`] if the area code is malformed, the industry code is
/// missing, or a count is invalid.
pub fn normalize(raw: &RawRow<'_>) -> Result<(AreaRecord, usize), RowError> {
    let row = raw.index;
    let area_raw = raw.area.unwrap_or_default();
    let area_code =
        AreaCode::from_raw(area_raw).map_err(|source| RowError::MalformedAreaCode {
            row,
            raw: area_raw.to_string(),
            source,
        })?;

    let industry_code = raw.industry_code.map(str::trim).unwrap_or_default();
    if industry_code.is_empty() {
        return Err(RowError::MissingIndustryCode { row });
    }

    let establishments = parse_count(row, "establishments", raw.establishments)?;
    let employees = parse_count(row, "employees", raw.employees)?;
    let population = parse_count(row, "population", raw.population)?;

    let suppressed = [establishments, employees, population]
        .iter()
        .filter(|c| c.suppressed)
        .count();

    let area_name = non_empty(raw.area_name).unwrap_or_else(|| area_code.as_str());
    let industry_name = non_empty(raw.industry_name).unwrap_or(industry_code);

    let record = AreaRecord {
        area_name: area_name.to_string(),
        area_code,
        industry_code: industry_code.to_string(),
        industry_name: industry_name.to_string(),
        establishments: establishments.value,
        employees: employees.value,
        population: population.value,
        time_period: raw.time_period.map(str::trim).unwrap_or_default().to_string(),
    };

    Ok((record, suppressed))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accumulates validated records and load statistics.
#[derive(Debug, Default)]
pub struct RowLoader {
    records: Vec<AreaRecord>,
    report: LoadReport,
}

impl RowLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and keeps `raw`, or logs and counts it as rejected.
    pub fn push(&mut self, raw: &RawRow<'_>) {
        self.report.rows_read += 1;
        match normalize(raw) {
            Ok((record, suppressed)) => {
                self.report.rows_loaded += 1;
                self.report.suppressed_cells += suppressed;
                self.records.push(record);
            }
            Err(e) => {
                log::warn!("Skipping row: {e}");
                self.report.rows_rejected += 1;
            }
        }
    }

    #[must_use]
    pub fn finish(self) -> (Vec<AreaRecord>, LoadReport) {
        (self.records, self.report)
    }
}
