//! Integrity checks over the reconciled table.
//!
//! National totals far above known population or establishment counts are
//! the signature of parent rows leaking past deduplication. The inspection
//! listing shows how every code under a prefix was classified.

use std::collections::BTreeMap;

use estat_density_area::CandidateSet;
use estat_density_area_models::{AreaClassification, AreaCode, AreaRecord};
use estat_density_dataset::Dataset;
use estat_density_models::{
    AreaInspection, BenchmarkBreach, BenchmarkCeilings, CityTotalCheck, IndustrySelection,
    InspectionReport, NationalTotals, Scope,
};

use crate::DensityError;
use crate::aggregate::aggregate;
use crate::engine::resolve_period;

/// Totals over the reconciled national "all industries" table for
/// `period` (latest when `None`).
#[must_use]
pub fn national_totals(dataset: &Dataset, period: Option<&str>) -> NationalTotals {
    let Some(period) = resolve_period(dataset, period) else {
        return NationalTotals {
            time_period: None,
            area_count: 0,
            establishments: 0,
            employees: 0,
            population: 0,
        };
    };

    let aggregation = aggregate(
        dataset.records().iter().filter(|r| r.time_period == period),
        &Scope::Nation,
        &IndustrySelection::All,
    );
    let rows = &aggregation.rows;

    let totals = NationalTotals {
        time_period: Some(period.to_string()),
        area_count: rows.len(),
        establishments: rows.iter().map(|r| r.establishments).sum(),
        employees: rows.iter().map(|r| r.employees).sum(),
        population: rows.iter().map(|r| r.population).sum(),
    };

    log::info!(
        "National totals for '{period}': {} areas, {} establishments, {} employees, {} residents",
        totals.area_count,
        totals.establishments,
        totals.employees,
        totals.population
    );

    totals
}

/// Lists the national totals that exceed their ceilings.
#[must_use]
pub fn check(totals: &NationalTotals, ceilings: &BenchmarkCeilings) -> Vec<BenchmarkBreach> {
    [
        ("establishments", totals.establishments, ceilings.establishments_max),
        ("employees", totals.employees, ceilings.employees_max),
        ("population", totals.population, ceilings.population_max),
    ]
    .into_iter()
    .filter(|(_, value, ceiling)| value > ceiling)
    .map(|(measure, value, ceiling)| {
        log::warn!(
            "National {measure} total {value} exceeds ceiling {ceiling}; parent rows may be double counted"
        );
        BenchmarkBreach {
            measure: measure.to_string(),
            value,
            ceiling,
        }
    })
    .collect()
}

/// Classifies every distinct code starting with `prefix`, relative to all
/// codes of the period, and compares each designated-city total with the
/// sum of its wards.
///
/// # Errors
///
/// Returns [`DensityError::InvalidQuery`] if `prefix` is empty, longer than
/// five characters, or not all digits.
pub fn inspect(
    dataset: &Dataset,
    prefix: &str,
    period: Option<&str>,
) -> Result<InspectionReport, DensityError> {
    let prefix = prefix.trim();
    if prefix.is_empty() || prefix.len() > AreaCode::WIDTH || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DensityError::InvalidQuery {
            message: format!("area prefix '{prefix}' must be 1-5 digits"),
        });
    }

    let Some(period) = resolve_period(dataset, period) else {
        return Ok(InspectionReport {
            prefix: prefix.to_string(),
            time_period: None,
            areas: Vec::new(),
            city_totals: Vec::new(),
        });
    };

    let records: Vec<&AreaRecord> = dataset
        .records()
        .iter()
        .filter(|r| r.time_period == period)
        .collect();
    let candidates = CandidateSet::from_records(records.iter().copied());

    // code -> (name, max population over industry rows)
    let mut areas: BTreeMap<&AreaCode, (&str, u64)> = BTreeMap::new();
    for record in &records {
        let entry = areas
            .entry(&record.area_code)
            .or_insert((record.area_name.as_str(), 0));
        entry.1 = entry.1.max(record.population);
    }

    let population_of = |code: &AreaCode| areas.get(code).map_or(0, |(_, population)| *population);

    let listing: Vec<AreaInspection> = areas
        .iter()
        .filter(|(code, _)| code.as_str().starts_with(prefix))
        .map(|(code, (name, population))| AreaInspection {
            area_code: (*code).clone(),
            area_name: (*name).to_string(),
            classification: candidates.classify(code, *population),
            population: *population,
            owning_city: candidates.owning_city(code).cloned(),
        })
        .collect();

    let city_totals = listing
        .iter()
        .filter(|area| area.classification == AreaClassification::DesignatedCityTotal)
        .map(|area| {
            let wards: Vec<&AreaCode> = candidates.wards_of(&area.area_code).collect();
            CityTotalCheck {
                city_code: area.area_code.clone(),
                city_name: area.area_name.clone(),
                city_population: area.population,
                ward_count: wards.len(),
                ward_population: wards.iter().map(|&ward| population_of(ward)).sum(),
            }
        })
        .collect();

    Ok(InspectionReport {
        prefix: prefix.to_string(),
        time_period: Some(period.to_string()),
        areas: listing,
        city_totals,
    })
}
