#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Density rankings over reconciled municipal units.
//!
//! The pipeline runs strictly one way: raw rows are narrowed to one survey
//! period, deduplicated against the codes actually in play, aggregated per
//! area for the selected industry, and finally turned into densities,
//! population-weighted averages, deviations, and national ranks. Every step
//! is a pure function producing a new table; [`engine::DensityEngine`]
//! memoises complete reports per query.

pub mod aggregate;
pub mod calc;
pub mod catalog;
pub mod engine;
pub mod verify;

pub use aggregate::{Aggregation, aggregate};
pub use calc::{RankTable, compute_derived, density, national_ranks, weighted_average};
pub use engine::{DensityEngine, run};

/// Errors returned when answering a density query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DensityError {
    /// The query itself is unusable (e.g. a zero result limit).
    #[error("Invalid query: {message}")]
    InvalidQuery {
        /// What is wrong with the query.
        message: String,
    },
}

#[cfg(test)]
pub(crate) mod fixtures {
    use estat_density_area_models::{AreaCode, AreaRecord};

    pub fn record(
        code: &str,
        industry: &str,
        establishments: u64,
        employees: u64,
        population: u64,
    ) -> AreaRecord {
        AreaRecord {
            area_code: AreaCode::new(code).unwrap(),
            area_name: format!("area {code}"),
            industry_code: industry.to_string(),
            industry_name: format!("industry {industry}"),
            establishments,
            employees,
            population,
            time_period: "2014".to_string(),
        }
    }

    /// A small two-prefecture dataset: Kanagawa with Yokohama (two wards)
    /// and an ordinary city, Tokyo with two ordinary cities, plus nation
    /// and prefecture totals that must never be counted.
    pub fn sample() -> Vec<AreaRecord> {
        let mut rows = Vec::new();
        for industry in ["A", "B"] {
            rows.push(record("00000", industry, 1_000, 10_000, 1_000_000));
            rows.push(record("14000", industry, 600, 6_000, 600_000));
            rows.push(record("14100", industry, 500, 5_000, 500_000));
            rows.push(record("13000", industry, 400, 4_000, 400_000));
        }
        rows.extend([
            record("14101", "A", 100, 1_000, 200_000),
            record("14101", "B", 20, 200, 200_000),
            record("14102", "A", 90, 900, 300_000),
            record("14102", "B", 30, 300, 300_000),
            record("14201", "A", 40, 400, 100_000),
            record("14201", "B", 10, 100, 100_000),
            record("13201", "A", 300, 3_000, 300_000),
            record("13201", "B", 50, 500, 300_000),
            record("13202", "A", 2, 20, 4_000),
            record("13202", "B", 1, 10, 4_000),
        ]);
        rows
    }
}
