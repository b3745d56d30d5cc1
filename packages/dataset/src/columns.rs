//! Header resolution for the joined census table.
//!
//! Upstream exports have used both the e-Stat API field names (`area`,
//! `sicCode`, `@time`) and spelled-out names (`areaCode`, `industryCode`,
//! `timePeriod`). Matching is case-insensitive and ignores a UTF-8 BOM on
//! the first header.

use crate::DatasetError;

/// A logical column and the header names accepted for it.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// Canonical name reported in errors.
    pub name: &'static str,
    /// Accepted header spellings, canonical first.
    pub aliases: &'static [&'static str],
}

pub const AREA: Column = Column {
    name: "area",
    aliases: &["area", "areaCode", "area_code"],
};
pub const AREA_NAME: Column = Column {
    name: "areaName",
    aliases: &["areaName", "area_name"],
};
pub const INDUSTRY_CODE: Column = Column {
    name: "sicCode",
    aliases: &["sicCode", "industryCode", "sic_code", "industry_code"],
};
pub const INDUSTRY_NAME: Column = Column {
    name: "sicName",
    aliases: &["sicName", "industryName", "sic_name", "industry_name"],
};
pub const ESTABLISHMENTS: Column = Column {
    name: "establishments",
    aliases: &["establishments"],
};
pub const EMPLOYEES: Column = Column {
    name: "employees",
    aliases: &["employees"],
};
pub const POPULATION: Column = Column {
    name: "population",
    aliases: &["population"],
};
pub const TIME_PERIOD: Column = Column {
    name: "@time",
    aliases: &["@time", "timePeriod", "time", "time_period"],
};

/// Positions of each logical column within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub area: usize,
    pub area_name: Option<usize>,
    pub industry_code: usize,
    pub industry_name: Option<usize>,
    pub establishments: usize,
    pub employees: usize,
    pub population: usize,
    pub time_period: Option<usize>,
}

impl ColumnMap {
    /// Resolves column positions from a header row.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingColumn`] for the first required column
    /// with no matching header.
    pub fn resolve<I, S>(headers: I) -> Result<Self, DatasetError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers: Vec<String> = headers
            .into_iter()
            .map(|h| h.as_ref().trim().trim_start_matches('\u{feff}').to_string())
            .collect();

        let required = |column: Column| {
            find(&headers, column).ok_or_else(|| DatasetError::MissingColumn {
                column: column.name,
                available: headers.clone(),
            })
        };

        Ok(Self {
            area: required(AREA)?,
            area_name: find(&headers, AREA_NAME),
            industry_code: required(INDUSTRY_CODE)?,
            industry_name: find(&headers, INDUSTRY_NAME),
            establishments: required(ESTABLISHMENTS)?,
            employees: required(EMPLOYEES)?,
            population: required(POPULATION)?,
            time_period: find(&headers, TIME_PERIOD),
        })
    }
}

fn find(headers: &[String], column: Column) -> Option<usize> {
    column.aliases.iter().find_map(|alias| {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(alias))
    })
}
