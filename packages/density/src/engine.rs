//! Query execution and memoisation.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use estat_density_area_models::AreaRecord;
use estat_density_dataset::Dataset;
use estat_density_models::{
    AreaTotals, DensityQuery, DensityReport, Metric, ReconciledAreaRow, Scope,
};

use crate::DensityError;
use crate::aggregate::aggregate;
use crate::calc::{compute_derived, national_ranks, weighted_average};

/// Answers `query` against `dataset`.
///
/// Ranks come from the national table of the resolved period, so they do
/// not depend on the scope, population floor, or limit. The summary and
/// deviations cover the scope's units at or above the population floor.
///
/// # Errors
///
/// Returns [`DensityError::InvalidQuery`] if `query.limit` is zero.
pub fn run(dataset: &Dataset, query: &DensityQuery) -> Result<DensityReport, DensityError> {
    if query.limit == 0 {
        return Err(DensityError::InvalidQuery {
            message: "limit must be positive".to_string(),
        });
    }

    let Some(period) = resolve_period(dataset, query.time_period.as_deref()) else {
        log::debug!("No data for period {:?}", query.time_period);
        return Ok(empty_report(query));
    };

    let records: Vec<&AreaRecord> = dataset
        .records()
        .iter()
        .filter(|r| r.time_period == period)
        .collect();

    let national = aggregate(records.iter().copied(), &Scope::Nation, &query.industry);
    let ranks = national_ranks(&national.rows);

    let scoped = match query.scope {
        Scope::Nation => national,
        Scope::Prefecture(_) => aggregate(records.iter().copied(), &query.scope, &query.industry),
    };

    let floored: Vec<AreaTotals> = scoped
        .rows
        .into_iter()
        .filter(|r| r.population >= query.population_floor)
        .collect();
    let derived = compute_derived(floored, &ranks);

    let mut rows: Vec<ReconciledAreaRow> = derived.rows;
    let matching_rows = rows.len();

    sort_rows(&mut rows, query.sort_by);
    rows.truncate(query.limit);

    log::debug!(
        "Query scope={} industry={} period='{period}': {matching_rows} rows above floor {}, returning {}",
        query.scope,
        query.industry,
        query.population_floor,
        rows.len()
    );

    Ok(DensityReport {
        query: query.clone(),
        time_period: Some(period.to_string()),
        summary: derived.summary,
        rows,
        matching_rows,
        warnings: scoped.warnings,
    })
}

pub(crate) fn resolve_period<'a>(dataset: &'a Dataset, requested: Option<&'a str>) -> Option<&'a str> {
    match requested {
        Some(period) => dataset.has_period(period).then_some(period),
        None => dataset.latest_period(),
    }
}

fn empty_report(query: &DensityQuery) -> DensityReport {
    DensityReport {
        query: query.clone(),
        time_period: None,
        summary: weighted_average(&[]),
        rows: Vec::new(),
        matching_rows: 0,
        warnings: Vec::new(),
    }
}

/// Orders by `metric` descending, rows without a density last, ties by
/// area code.
fn sort_rows(rows: &mut [ReconciledAreaRow], metric: Metric) {
    rows.sort_by(|a, b| {
        match (a.density(metric), b.density(metric)) {
            (Some(x), Some(y)) => y.total_cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then_with(|| a.area_code.cmp(&b.area_code))
    });
}

/// Memoising front end over a shared, immutable [`Dataset`].
///
/// Reports are cached per [`DensityQuery`]. When the cache reaches its
/// capacity it is cleared before the next insert. A capacity of zero
/// disables caching.
#[derive(Debug)]
pub struct DensityEngine<'a> {
    dataset: &'a Dataset,
    capacity: usize,
    cache: Mutex<BTreeMap<DensityQuery, Arc<DensityReport>>>,
}

impl<'a> DensityEngine<'a> {
    #[must_use]
    pub const fn new(dataset: &'a Dataset, capacity: usize) -> Self {
        Self {
            dataset,
            capacity,
            cache: Mutex::new(BTreeMap::new()),
        }
    }

    /// The dataset this engine answers queries against.
    #[must_use]
    pub const fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Returns the report for `query`, computing it on a cache miss.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::InvalidQuery`] if the query is invalid.
    pub fn report(&self, query: &DensityQuery) -> Result<Arc<DensityReport>, DensityError> {
        let cached = self.lock().get(query).cloned();
        if let Some(report) = cached {
            log::trace!("Cache hit for {query:?}");
            return Ok(report);
        }

        let report = Arc::new(run(self.dataset, query)?);

        if self.capacity > 0 {
            let mut cache = self.lock();
            if cache.len() >= self.capacity {
                log::debug!("Report cache full ({} entries), clearing", cache.len());
                cache.clear();
            }
            cache.insert(query.clone(), Arc::clone(&report));
        }

        Ok(report)
    }

    /// Number of cached reports.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DensityQuery, Arc<DensityReport>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use estat_density_models::IndustrySelection;

    use super::*;
    use crate::fixtures::{record, sample};

    fn dataset() -> Dataset {
        Dataset::from_records(sample())
    }

    fn query(scope: Scope) -> DensityQuery {
        DensityQuery {
            population_floor: 0,
            ..DensityQuery::new(scope, IndustrySelection::All)
        }
    }

    fn kanagawa() -> Scope {
        Scope::Prefecture("14".to_string())
    }

    fn rank_of(report: &DensityReport, code: &str) -> Option<u32> {
        report
            .rows
            .iter()
            .find(|r| r.area_code.as_str() == code)
            .and_then(|r| r.est_rank)
    }

    #[test]
    fn national_ranking() {
        let report = run(&dataset(), &query(Scope::Nation)).unwrap();
        let codes: Vec<&str> = report.rows.iter().map(|r| r.area_code.as_str()).collect();
        // est densities: 13202 7.5, 14101 6, 13201 ~11.67, 14102 4, 14201 5
        assert_eq!(codes, ["13201", "13202", "14101", "14201", "14102"]);
        assert_eq!(report.rows[0].est_rank, Some(1));
        assert_eq!(report.rows[4].est_rank, Some(5));
        assert_eq!(report.summary.total_population, 904_000);
        assert_eq!(report.time_period.as_deref(), Some("2014"));
        assert_eq!(report.matching_rows, 5);
    }

    #[test]
    fn rank_is_stable_under_scope_narrowing() {
        let dataset = dataset();
        let nation = run(&dataset, &query(Scope::Nation)).unwrap();
        let scoped = run(&dataset, &query(kanagawa())).unwrap();

        assert_eq!(scoped.rows.len(), 3);
        for row in &scoped.rows {
            assert_eq!(row.est_rank, rank_of(&nation, row.area_code.as_str()));
        }
        assert_eq!(scoped.summary.total_population, 600_000);
    }

    #[test]
    fn population_floor_does_not_change_ranks() {
        let dataset = dataset();
        let all = run(&dataset, &query(Scope::Nation)).unwrap();
        let floored = run(
            &dataset,
            &DensityQuery {
                population_floor: 150_000,
                ..query(Scope::Nation)
            },
        )
        .unwrap();

        assert_eq!(floored.matching_rows, 3);
        assert!(floored.rows.iter().all(|r| r.population >= 150_000));
        for row in &floored.rows {
            assert_eq!(row.est_rank, rank_of(&all, row.area_code.as_str()));
        }
        assert_eq!(floored.summary.area_count, 3);
        assert_eq!(floored.summary.total_population, 800_000);
        assert_ne!(floored.summary, all.summary);
    }

    #[test]
    fn summary_and_deviations_follow_the_floor() {
        let report = run(
            &dataset(),
            &DensityQuery {
                population_floor: 100_000,
                ..query(Scope::Prefecture("13".to_string()))
            },
        )
        .unwrap();

        let codes: Vec<&str> = report.rows.iter().map(|r| r.area_code.as_str()).collect();
        assert_eq!(codes, ["13201"]);
        assert_eq!(report.summary.area_count, 1);
        assert_eq!(report.summary.total_population, 300_000);
        assert_eq!(report.summary.total_establishments, 350);
        // the only unit left is the whole region, so it sits on the average
        assert!(report.rows[0].est_deviation.is_some_and(|d| d.abs() < 1e-9));
        // 13202 is still counted in the national ranking
        assert_eq!(report.rows[0].est_rank, Some(1));
    }

    #[test]
    fn limit_and_sort_metric() {
        let report = run(
            &dataset(),
            &DensityQuery {
                limit: 2,
                sort_by: Metric::EmploymentDensity,
                ..query(kanagawa())
            },
        )
        .unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.matching_rows, 3);
        assert!(report.rows[0].emp_density >= report.rows[1].emp_density);
    }

    #[test]
    fn zero_limit_is_invalid() {
        let err = run(
            &dataset(),
            &DensityQuery {
                limit: 0,
                ..query(Scope::Nation)
            },
        )
        .unwrap_err();
        assert!(matches!(err, DensityError::InvalidQuery { .. }));
    }

    #[test]
    fn unknown_industry_or_period_is_empty() {
        let dataset = dataset();
        let report = run(
            &dataset,
            &DensityQuery {
                industry: IndustrySelection::Code("Z".to_string()),
                ..query(Scope::Nation)
            },
        )
        .unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.summary.weighted_est_density, None);

        let report = run(
            &dataset,
            &DensityQuery {
                time_period: Some("1999".to_string()),
                ..query(Scope::Nation)
            },
        )
        .unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.time_period, None);
    }

    #[test]
    fn latest_period_is_default() {
        let mut rows = sample();
        let mut later = record("14201", "A", 1, 1, 100_000);
        later.time_period = "2016".to_string();
        rows.push(later);
        let dataset = Dataset::from_records(rows);

        let report = run(&dataset, &query(Scope::Nation)).unwrap();
        assert_eq!(report.time_period.as_deref(), Some("2016"));
        assert_eq!(report.rows.len(), 1);

        let report = run(
            &dataset,
            &DensityQuery {
                time_period: Some("2014".to_string()),
                ..query(Scope::Nation)
            },
        )
        .unwrap();
        assert_eq!(report.rows.len(), 5);
    }

    #[test]
    fn idempotent() {
        let dataset = dataset();
        let first = run(&dataset, &query(kanagawa())).unwrap();
        let second = run(&dataset, &query(kanagawa())).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn engine_memoises_and_clears() {
        let dataset = dataset();
        let engine = DensityEngine::new(&dataset, 2);

        let a = engine.report(&query(Scope::Nation)).unwrap();
        let b = engine.report(&query(Scope::Nation)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(engine.cached(), 1);

        engine.report(&query(kanagawa())).unwrap();
        assert_eq!(engine.cached(), 2);
        engine
            .report(&query(Scope::Prefecture("13".to_string())))
            .unwrap();
        assert_eq!(engine.cached(), 1);
    }

    #[test]
    fn engine_does_not_cache_errors() {
        let dataset = dataset();
        let engine = DensityEngine::new(&dataset, 4);
        let bad = DensityQuery {
            limit: 0,
            ..query(Scope::Nation)
        };
        assert!(engine.report(&bad).is_err());
        assert_eq!(engine.cached(), 0);
    }
}
