//! Densities, population-weighted averages, deviations, and ranks.

use std::collections::BTreeMap;

use estat_density_area_models::AreaCode;
use estat_density_models::{AreaTotals, Metric, PER_RESIDENTS, ReconciledAreaRow, RegionSummary};

/// `count` per 10,000 residents; `None` when there are no residents.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn density(count: u64, population: u64) -> Option<f64> {
    (population > 0).then(|| count as f64 / population as f64 * PER_RESIDENTS)
}

/// Treats `rows` as one synthetic municipality: summed counts over summed
/// population. Averages are `None` when the summed population is zero.
#[must_use]
pub fn weighted_average(rows: &[AreaTotals]) -> RegionSummary {
    let total_population: u64 = rows.iter().map(|r| r.population).sum();
    let total_establishments: u64 = rows.iter().map(|r| r.establishments).sum();
    let total_employees: u64 = rows.iter().map(|r| r.employees).sum();

    RegionSummary {
        area_count: rows.len(),
        total_population,
        total_establishments,
        total_employees,
        weighted_est_density: density(total_establishments, total_population),
        weighted_emp_density: density(total_employees, total_population),
    }
}

/// National rank labels per area code, for both metrics.
///
/// Ties share a rank, and the next rank equals the number of strictly
/// denser areas plus one (`1, 2, 2, 4`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankTable {
    est: BTreeMap<AreaCode, u32>,
    emp: BTreeMap<AreaCode, u32>,
}

impl RankTable {
    /// Rank of `code` for `metric`, if the area was ranked.
    #[must_use]
    pub fn rank(&self, code: &AreaCode, metric: Metric) -> Option<u32> {
        match metric {
            Metric::EstablishmentDensity => self.est.get(code).copied(),
            Metric::EmploymentDensity => self.emp.get(code).copied(),
        }
    }

    /// Number of ranked areas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.est.len()
    }

    /// Whether no area was ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.est.is_empty()
    }
}

/// Ranks every area of the national reconciled table by descending
/// density. Areas without a density are left unranked.
///
/// `rows` must hold a single survey period.
#[must_use]
pub fn national_ranks(rows: &[AreaTotals]) -> RankTable {
    RankTable {
        est: rank_by(rows, |r| density(r.establishments, r.population)),
        emp: rank_by(rows, |r| density(r.employees, r.population)),
    }
}

fn rank_by(rows: &[AreaTotals], value: impl Fn(&AreaTotals) -> Option<f64>) -> BTreeMap<AreaCode, u32> {
    let valued: Vec<(&AreaCode, f64)> = rows
        .iter()
        .filter_map(|r| value(r).map(|v| (&r.area_code, v)))
        .collect();

    let mut descending: Vec<f64> = valued.iter().map(|(_, v)| *v).collect();
    descending.sort_by(|a, b| b.total_cmp(a));

    valued
        .into_iter()
        .map(|(code, v)| {
            let denser = descending.partition_point(|other| *other > v);
            (code.clone(), u32::try_from(denser + 1).unwrap_or(u32::MAX))
        })
        .collect()
}

/// Derived table for one scope: reconciled rows plus the scope's summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    pub rows: Vec<ReconciledAreaRow>,
    pub summary: RegionSummary,
}

/// Computes densities, deviations from the population-weighted average of
/// `base`, and attaches the national ranks from `ranks`.
#[must_use]
pub fn compute_derived(base: Vec<AreaTotals>, ranks: &RankTable) -> DerivedTable {
    let summary = weighted_average(&base);

    let rows = base
        .into_iter()
        .map(|totals| {
            let est_density = density(totals.establishments, totals.population);
            let emp_density = density(totals.employees, totals.population);
            ReconciledAreaRow {
                est_deviation: deviation(est_density, summary.weighted_est_density),
                emp_deviation: deviation(emp_density, summary.weighted_emp_density),
                est_rank: ranks.rank(&totals.area_code, Metric::EstablishmentDensity),
                emp_rank: ranks.rank(&totals.area_code, Metric::EmploymentDensity),
                est_density,
                emp_density,
                area_code: totals.area_code,
                area_name: totals.area_name,
                time_period: totals.time_period,
                establishments: totals.establishments,
                employees: totals.employees,
                population: totals.population,
            }
        })
        .collect();

    DerivedTable { rows, summary }
}

fn deviation(value: Option<f64>, average: Option<f64>) -> Option<f64> {
    Some(value? - average?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(code: &str, establishments: u64, employees: u64, population: u64) -> AreaTotals {
        AreaTotals {
            area_code: AreaCode::new(code).unwrap(),
            area_name: format!("area {code}"),
            time_period: "2014".to_string(),
            establishments,
            employees,
            population,
        }
    }

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn density_per_ten_thousand() {
        assert!(close(density(15, 5_000), 30.0));
        assert_eq!(density(15, 0), None);
    }

    #[test]
    fn weighted_average_is_not_the_mean() {
        // densities 100 and 25 per 10,000
        let rows = [totals("14201", 10, 0, 1_000), totals("14202", 10, 0, 4_000)];
        let summary = weighted_average(&rows);
        assert!(close(summary.weighted_est_density, 40.0));
        assert!(!close(summary.weighted_est_density, 62.5));
        assert_eq!(summary.total_population, 5_000);
        assert_eq!(summary.area_count, 2);
    }

    #[test]
    fn empty_set_has_no_average() {
        let summary = weighted_average(&[]);
        assert_eq!(summary.weighted_est_density, None);
        assert_eq!(summary.weighted_emp_density, None);
        assert_eq!(summary.total_population, 0);
    }

    #[test]
    fn ties_share_a_rank() {
        let rows = [
            totals("01100", 10, 0, 1_000),
            totals("01202", 5, 0, 1_000),
            totals("01203", 10, 0, 2_000),
            totals("01204", 1, 0, 1_000),
        ];
        let ranks = national_ranks(&rows);
        let rank = |code: &str| ranks.rank(&AreaCode::new(code).unwrap(), Metric::EstablishmentDensity);
        assert_eq!(rank("01100"), Some(1));
        assert_eq!(rank("01202"), Some(2));
        assert_eq!(rank("01203"), Some(2));
        assert_eq!(rank("01204"), Some(4));
        assert_eq!(ranks.len(), 4);
    }

    #[test]
    fn zero_population_is_unranked() {
        let rows = [totals("01100", 10, 10, 1_000), totals("01202", 5, 5, 0)];
        let ranks = national_ranks(&rows);
        assert_eq!(
            ranks.rank(&AreaCode::new("01202").unwrap(), Metric::EmploymentDensity),
            None
        );
    }

    #[test]
    fn deviations_from_weighted_average() {
        let base = vec![totals("14201", 10, 20, 1_000), totals("14202", 10, 20, 4_000)];
        let ranks = national_ranks(&base);
        let derived = compute_derived(base, &ranks);

        assert!(close(derived.rows[0].est_density, 100.0));
        assert!(close(derived.rows[0].est_deviation, 60.0));
        assert!(close(derived.rows[1].est_deviation, -15.0));
        assert!(close(derived.rows[1].emp_deviation, -30.0));
        assert_eq!(derived.rows[0].est_rank, Some(1));
        assert_eq!(derived.rows[1].emp_rank, Some(2));
    }

    #[test]
    fn rows_outside_the_rank_table_have_no_rank() {
        let ranks = RankTable::default();
        assert!(ranks.is_empty());
        let derived = compute_derived(vec![totals("14201", 1, 1, 100)], &ranks);
        assert_eq!(derived.rows[0].est_rank, None);
        assert!(derived.rows[0].est_density.is_some());
    }
}
