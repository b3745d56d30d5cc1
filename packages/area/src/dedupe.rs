//! Removal of redundant parent rows.
//!
//! Must run against the rows actually in play (after any scope filtering),
//! since the designated-city check depends on which sibling codes are
//! visible.

use std::collections::{BTreeMap, BTreeSet};

use estat_density_area_models::{AreaClassification, AreaRecord};

use crate::classify::CandidateSet;

/// Result of [`dedupe_with_report`].
#[derive(Debug, Clone, Default)]
pub struct DedupeOutcome<'a> {
    /// Atomic rows, one per area/industry/period, in input order.
    pub rows: Vec<&'a AreaRecord>,
    /// Number of rows dropped per classification.
    pub removed: BTreeMap<AreaClassification, usize>,
    /// Rows dropped because an earlier row had the same area, industry,
    /// and period.
    pub duplicate_rows: usize,
}

/// Keeps only rows of atomic municipal units (wards and ordinary
/// municipalities with residents).
///
/// Pure: the input is not modified and the classification is computed
/// from the codes present in `rows` at call time.
pub fn dedupe<'a, I>(rows: I) -> Vec<&'a AreaRecord>
where
    I: IntoIterator<Item = &'a AreaRecord>,
{
    dedupe_with_report(rows).rows
}

/// Same as [`dedupe`], also reporting what was removed.
pub fn dedupe_with_report<'a, I>(rows: I) -> DedupeOutcome<'a>
where
    I: IntoIterator<Item = &'a AreaRecord>,
{
    let rows: Vec<&'a AreaRecord> = rows.into_iter().collect();
    let candidates = CandidateSet::from_records(rows.iter().copied());

    let mut outcome = DedupeOutcome {
        rows: Vec::with_capacity(rows.len()),
        ..DedupeOutcome::default()
    };
    let mut seen: BTreeSet<(&'a str, &'a str, &'a str)> = BTreeSet::new();

    for row in rows {
        let class = candidates.classify(&row.area_code, row.population);
        if !class.is_atomic() {
            *outcome.removed.entry(class).or_default() += 1;
            continue;
        }

        let key = (
            row.area_code.as_str(),
            row.industry_code.as_str(),
            row.time_period.as_str(),
        );
        if !seen.insert(key) {
            log::warn!(
                "Duplicate row for area {} industry '{}' period '{}', keeping the first",
                row.area_code,
                row.industry_code,
                row.time_period
            );
            outcome.duplicate_rows += 1;
            continue;
        }

        outcome.rows.push(row);
    }

    for (class, count) in &outcome.removed {
        log::debug!("dedupe: removed {count} {class} rows");
    }
    log::debug!(
        "dedupe: kept {} rows across {} candidate codes ({} designated-city totals)",
        outcome.rows.len(),
        candidates.len(),
        candidates.city_totals().count()
    );

    outcome
}
