#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Query and result types for density rankings.
//!
//! A [`DensityQuery`] is the full selection a consumer can make (scope,
//! industry, population floor, result limit, sort metric, survey period).
//! A [`DensityReport`] is the reconciled, ranked answer to it. Both are
//! plain serde types so the server and CLI can emit them directly.

use estat_density_area_models::{AreaClassification, AreaCode, prefectures};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Multiplier turning a per-resident ratio into "per 10,000 residents".
pub const PER_RESIDENTS: f64 = 10_000.0;

/// Sentinel industry code meaning "all industries combined".
pub const ALL_INDUSTRIES: &str = "__TOTAL__";

/// Display name of the combined-industries selection.
pub const ALL_INDUSTRIES_NAME: &str = "総計（全産業）";

/// Errors produced when parsing selection values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// The scope was neither `"00"` nor a known prefecture.
    #[error("unknown scope '{0}': expected \"00\" or a prefecture code 01-47")]
    UnknownScope(String),
}

/// Geographic scope of a query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Scope {
    /// Every atomic unit nationwide (`"00"`).
    Nation,
    /// Atomic units whose code starts with this two-digit prefecture code.
    Prefecture(String),
}

impl Scope {
    /// Wire value of the nation-wide scope.
    pub const NATION_CODE: &'static str = "00";

    /// Whether `code` falls inside this scope.
    #[must_use]
    pub fn contains(&self, code: &AreaCode) -> bool {
        match self {
            Self::Nation => true,
            Self::Prefecture(pref) => code.prefecture() == pref,
        }
    }

    /// Two-digit wire code (`"00"` for the nation).
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Nation => Self::NATION_CODE,
            Self::Prefecture(pref) => pref,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Scope {
    type Err = SelectionError;

    /// Accepts `"00"`/`"all"` for the nation, a two-digit prefecture code,
    /// a single-digit code (`"1"` for Hokkaido), or a prefecture name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == Self::NATION_CODE || s.eq_ignore_ascii_case("all") {
            return Ok(Self::Nation);
        }
        let padded = format!("{s:0>2}");
        if prefectures::is_prefecture_code(&padded) {
            return Ok(Self::Prefecture(padded));
        }
        prefectures::code_for_name(s)
            .map(|code| Self::Prefecture(code.to_string()))
            .ok_or_else(|| SelectionError::UnknownScope(s.to_string()))
    }
}

impl TryFrom<String> for Scope {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.code().to_string()
    }
}

/// Industry selection of a query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IndustrySelection {
    /// Sum of every industry row per area.
    All,
    /// A single industry code, matched exactly (codes are never padded).
    Code(String),
}

impl IndustrySelection {
    /// Wire value of this selection.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::All => ALL_INDUSTRIES,
            Self::Code(code) => code,
        }
    }
}

impl std::fmt::Display for IndustrySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl From<&str> for IndustrySelection {
    fn from(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_INDUSTRIES || value.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Code(value.to_string())
        }
    }
}

impl From<String> for IndustrySelection {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<IndustrySelection> for String {
    fn from(selection: IndustrySelection) -> Self {
        selection.code().to_string()
    }
}

/// Density metric used to order displayed rows.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(ascii_case_insensitive)]
pub enum Metric {
    /// Establishments per 10,000 residents.
    #[default]
    #[strum(to_string = "establishmentDensity", serialize = "est")]
    EstablishmentDensity,
    /// Employees per 10,000 residents.
    #[strum(to_string = "employmentDensity", serialize = "emp")]
    EmploymentDensity,
}

/// A complete selection over the dataset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityQuery {
    /// Nation or a single prefecture.
    pub scope: Scope,
    /// One industry or all industries combined.
    pub industry: IndustrySelection,
    /// Rows below this population are hidden from the ranking (ranks are
    /// unaffected).
    pub population_floor: u64,
    /// Maximum number of ranked rows returned. Must be positive.
    pub limit: usize,
    /// Metric the displayed rows are ordered by.
    pub sort_by: Metric,
    /// Survey period; `None` selects the latest period in the dataset.
    pub time_period: Option<String>,
}

impl DensityQuery {
    /// Default population floor used by the dashboard to suppress noise
    /// from very small municipalities.
    pub const DEFAULT_POPULATION_FLOOR: u64 = 5_000;

    /// Default ranking size.
    pub const DEFAULT_LIMIT: usize = 50;

    /// A query over `scope` and `industry` with default display settings.
    #[must_use]
    pub const fn new(scope: Scope, industry: IndustrySelection) -> Self {
        Self {
            scope,
            industry,
            population_floor: Self::DEFAULT_POPULATION_FLOOR,
            limit: Self::DEFAULT_LIMIT,
            sort_by: Metric::EstablishmentDensity,
            time_period: None,
        }
    }
}

/// Per-area counts for one industry selection, before derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTotals {
    /// Five-digit area code.
    pub area_code: AreaCode,
    /// Display name.
    pub area_name: String,
    /// Survey period the counts belong to.
    pub time_period: String,
    /// Establishments (summed across industries for the combined view).
    pub establishments: u64,
    /// Employees (summed across industries for the combined view).
    pub employees: u64,
    /// Resident population, taken once per area.
    pub population: u64,
}

/// One atomic municipal unit with its derived density metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledAreaRow {
    /// Five-digit area code.
    pub area_code: AreaCode,
    /// Display name.
    pub area_name: String,
    /// Survey period.
    pub time_period: String,
    /// Establishment count.
    pub establishments: u64,
    /// Employee count.
    pub employees: u64,
    /// Resident population.
    pub population: u64,
    /// Establishments per 10,000 residents.
    pub est_density: Option<f64>,
    /// Employees per 10,000 residents.
    pub emp_density: Option<f64>,
    /// Difference from the scope's population-weighted establishment density.
    pub est_deviation: Option<f64>,
    /// Difference from the scope's population-weighted employment density.
    pub emp_deviation: Option<f64>,
    /// National rank by establishment density (1 = densest).
    pub est_rank: Option<u32>,
    /// National rank by employment density (1 = densest).
    pub emp_rank: Option<u32>,
}

impl ReconciledAreaRow {
    /// Density value for `metric`.
    #[must_use]
    pub const fn density(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::EstablishmentDensity => self.est_density,
            Metric::EmploymentDensity => self.emp_density,
        }
    }

    /// National rank for `metric`.
    #[must_use]
    pub const fn rank(&self, metric: Metric) -> Option<u32> {
        match metric {
            Metric::EstablishmentDensity => self.est_rank,
            Metric::EmploymentDensity => self.emp_rank,
        }
    }
}

/// Aggregate over a set of rows, treating the region as one municipality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSummary {
    /// Number of atomic units summed.
    pub area_count: usize,
    /// Total resident population.
    pub total_population: u64,
    /// Total establishments.
    pub total_establishments: u64,
    /// Total employees.
    pub total_employees: u64,
    /// `sum(establishments) / sum(population) * 10,000`; `None` without residents.
    pub weighted_est_density: Option<f64>,
    /// `sum(employees) / sum(population) * 10,000`; `None` without residents.
    pub weighted_emp_density: Option<f64>,
}

/// A data-integrity problem observed while answering a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DataWarning {
    /// Industry rows of one area/period disagree on the population.
    PopulationMismatch {
        /// Area whose rows disagree.
        area_code: AreaCode,
        /// Period of the rows.
        time_period: String,
        /// Distinct population values seen, ascending.
        values: Vec<u64>,
        /// Value used (the maximum).
        resolved: u64,
    },
}

/// Reconciled, ranked answer to a [`DensityQuery`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityReport {
    /// The query this report answers.
    pub query: DensityQuery,
    /// Period actually used (`None` when the dataset is empty or the
    /// requested period does not exist).
    pub time_period: Option<String>,
    /// Population-weighted figures over the scope's units at or above the
    /// population floor (before the limit).
    pub summary: RegionSummary,
    /// Displayed rows: at or above the floor, ordered by `query.sortBy`
    /// descending, at most `query.limit` long.
    pub rows: Vec<ReconciledAreaRow>,
    /// Number of rows at or above the population floor before the limit.
    pub matching_rows: usize,
    /// Data-integrity warnings raised while aggregating.
    pub warnings: Vec<DataWarning>,
}

/// A prefecture selectable as a scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrefectureInfo {
    /// Two-digit code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// An industry selectable in a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndustryInfo {
    /// Industry code, or [`ALL_INDUSTRIES`].
    pub code: String,
    /// Display name.
    pub name: String,
}

/// National totals over the reconciled "all industries" table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NationalTotals {
    /// Period the totals were computed for.
    pub time_period: Option<String>,
    /// Number of atomic units.
    pub area_count: usize,
    /// Total establishments.
    pub establishments: u64,
    /// Total employees.
    pub employees: u64,
    /// Total population.
    pub population: u64,
}

/// Plausibility ceilings for national totals. A reconciled total above
/// one of these points at parent rows leaking through deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkCeilings {
    pub establishments_max: u64,
    pub employees_max: u64,
    pub population_max: u64,
}

impl Default for BenchmarkCeilings {
    fn default() -> Self {
        Self {
            establishments_max: 10_000_000,
            employees_max: 100_000_000,
            population_max: 130_000_000,
        }
    }
}

/// A national total exceeding its plausibility ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkBreach {
    /// Which total (`"establishments"`, `"employees"`, `"population"`).
    pub measure: String,
    /// Observed total.
    pub value: u64,
    /// Configured ceiling.
    pub ceiling: u64,
}

/// Classification of one area code in an inspection listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaInspection {
    /// Five-digit area code.
    pub area_code: AreaCode,
    /// Display name.
    pub area_name: String,
    /// Role relative to the full candidate set.
    pub classification: AreaClassification,
    /// Resident population (maximum over industry rows).
    pub population: u64,
    /// Designated-city total this ward belongs to.
    pub owning_city: Option<AreaCode>,
}

/// A designated-city total compared against the sum of its wards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityTotalCheck {
    /// Code of the whole-city row.
    pub city_code: AreaCode,
    /// Display name of the whole-city row.
    pub city_name: String,
    /// Population on the whole-city row.
    pub city_population: u64,
    /// Number of wards present.
    pub ward_count: usize,
    /// Sum of the wards' populations.
    pub ward_population: u64,
}

/// Classification listing for the codes under a prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionReport {
    /// Code prefix inspected.
    pub prefix: String,
    /// Period inspected.
    pub time_period: Option<String>,
    /// Every distinct code under the prefix, ascending.
    pub areas: Vec<AreaInspection>,
    /// Designated-city totals under the prefix with their wards' sums.
    pub city_totals: Vec<CityTotalCheck>,
}
