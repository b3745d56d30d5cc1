//! Scope and industry aggregation.
//!
//! Scope filtering happens before deduplication so that the relational
//! designated-city check only sees the codes in play.

use std::collections::{BTreeMap, BTreeSet};

use estat_density_area::dedupe;
use estat_density_area_models::{AreaCode, AreaRecord};
use estat_density_models::{AreaTotals, DataWarning, IndustrySelection, Scope};

/// Per-area totals for one scope and industry selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    /// One entry per atomic unit and period, ordered by area code then
    /// period.
    pub rows: Vec<AreaTotals>,
    /// Integrity problems found while grouping.
    pub warnings: Vec<DataWarning>,
}

/// Aggregates `rows` for `scope` and `industry`.
///
/// A single industry keeps the matching row of each atomic unit. The
/// combined view sums establishments and employees across every industry
/// row of an area and takes the population once; if industry rows disagree
/// on the population the maximum is used and a
/// [`DataWarning::PopulationMismatch`] is recorded.
///
/// An unknown industry code or an empty scope yields no rows.
pub fn aggregate<'a, I>(rows: I, scope: &Scope, industry: &IndustrySelection) -> Aggregation
where
    I: IntoIterator<Item = &'a AreaRecord>,
{
    let atomic = dedupe(rows.into_iter().filter(|r| scope.contains(&r.area_code)));

    let aggregation = match industry {
        IndustrySelection::Code(code) => single_industry(&atomic, code),
        IndustrySelection::All => all_industries(&atomic),
    };

    log::debug!(
        "aggregate: scope={scope} industry={industry} -> {} areas, {} warnings",
        aggregation.rows.len(),
        aggregation.warnings.len()
    );

    aggregation
}

fn single_industry(rows: &[&AreaRecord], code: &str) -> Aggregation {
    let mut totals: Vec<AreaTotals> = rows
        .iter()
        .filter(|r| r.industry_code == code)
        .map(|r| AreaTotals {
            area_code: r.area_code.clone(),
            area_name: r.area_name.clone(),
            time_period: r.time_period.clone(),
            establishments: r.establishments,
            employees: r.employees,
            population: r.population,
        })
        .collect();
    totals.sort_by(|a, b| {
        a.area_code
            .cmp(&b.area_code)
            .then_with(|| a.time_period.cmp(&b.time_period))
    });

    Aggregation {
        rows: totals,
        warnings: Vec::new(),
    }
}

struct Group<'a> {
    area_name: &'a str,
    establishments: u64,
    employees: u64,
    populations: BTreeSet<u64>,
}

fn all_industries(rows: &[&AreaRecord]) -> Aggregation {
    let mut groups: BTreeMap<(&AreaCode, &str), Group<'_>> = BTreeMap::new();

    for row in rows {
        let group = groups
            .entry((&row.area_code, row.time_period.as_str()))
            .or_insert_with(|| Group {
                area_name: &row.area_name,
                establishments: 0,
                employees: 0,
                populations: BTreeSet::new(),
            });
        group.establishments += row.establishments;
        group.employees += row.employees;
        group.populations.insert(row.population);
    }

    let mut aggregation = Aggregation::default();

    for ((area_code, time_period), group) in groups {
        let population = group.populations.last().copied().unwrap_or_default();

        if group.populations.len() > 1 {
            let values: Vec<u64> = group.populations.iter().copied().collect();
            log::warn!(
                "Population differs across industries for area {area_code} period '{time_period}': {values:?}, using {population}"
            );
            aggregation.warnings.push(DataWarning::PopulationMismatch {
                area_code: area_code.clone(),
                time_period: time_period.to_string(),
                values,
                resolved: population,
            });
        }

        aggregation.rows.push(AreaTotals {
            area_code: area_code.clone(),
            area_name: group.area_name.to_string(),
            time_period: time_period.to_string(),
            establishments: group.establishments,
            employees: group.employees,
            population,
        });
    }

    aggregation
}
