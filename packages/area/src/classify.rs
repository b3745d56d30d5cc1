//! Structural classification of area codes.
//!
//! Nation and prefecture totals are recognised from digits alone. A
//! designated-city total (`PP1C0`) is only a redundant parent when its
//! wards are present in the same working set, so that part of the
//! classification is relational and must be recomputed whenever the set of
//! visible codes changes.
//!
//! Ward numbering runs past the four-digit sibling prefix for cities with
//! ten or more wards: Yokohama's wards are `14101`..`14118`, so Totsuka-ku
//! (`14110`) matches the designated-city digit pattern and has siblings
//! (`14111`..) of its own. A candidate with any code of the preceding
//! decade (`14101`..`14109`) present in its block continues the earlier
//! city's ward run and is therefore a ward, not a city total. Looking at the
//! whole decade keeps a single missing ward (`14109`) from promoting the next
//! one.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use estat_density_area_models::{AreaClassification, AreaCode, AreaRecord};

/// The codes visible in one working set, with designated-city structure
/// resolved against them.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    codes: BTreeSet<AreaCode>,
    city_totals: BTreeSet<AreaCode>,
    /// ward -> owning designated-city total
    wards: BTreeMap<AreaCode, AreaCode>,
}

impl CandidateSet {
    /// Builds the candidate set from the given codes. Duplicates are
    /// ignored.
    pub fn new<'a, I>(codes: I) -> Self
    where
        I: IntoIterator<Item = &'a AreaCode>,
    {
        let codes: BTreeSet<AreaCode> = codes.into_iter().cloned().collect();

        let city_totals: BTreeSet<AreaCode> = codes
            .iter()
            .filter(|code| is_city_total(code, &codes))
            .cloned()
            .collect();

        let mut wards = BTreeMap::new();
        for total in &city_totals {
            for code in codes.range((Bound::Excluded(total), Bound::Unbounded)) {
                if code.city_block() != total.city_block() || city_totals.contains(code) {
                    break;
                }
                wards.insert(code.clone(), total.clone());
            }
        }

        Self {
            codes,
            city_totals,
            wards,
        }
    }

    /// Builds the candidate set from the area codes of `records`.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a AreaRecord>,
    {
        Self::new(records.into_iter().map(|r| &r.area_code))
    }

    /// Number of distinct codes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the set holds no codes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Whether `code` is part of the working set.
    #[must_use]
    pub fn contains(&self, code: &AreaCode) -> bool {
        self.codes.contains(code)
    }

    /// All distinct codes in ascending order.
    pub fn codes(&self) -> impl Iterator<Item = &AreaCode> {
        self.codes.iter()
    }

    /// Designated-city totals whose wards are present, in ascending order.
    pub fn city_totals(&self) -> impl Iterator<Item = &AreaCode> {
        self.city_totals.iter()
    }

    /// Wards belonging to the designated-city total `total`.
    pub fn wards_of<'a>(&'a self, total: &'a AreaCode) -> impl Iterator<Item = &'a AreaCode> {
        self.wards
            .iter()
            .filter(move |(_, owner)| *owner == total)
            .map(|(ward, _)| ward)
    }

    /// The designated-city total a ward belongs to.
    #[must_use]
    pub fn owning_city(&self, ward: &AreaCode) -> Option<&AreaCode> {
        self.wards.get(ward)
    }

    /// Classifies `code` relative to this working set.
    ///
    /// Parent totals are recognised regardless of population. Rows that
    /// would otherwise be atomic are [`AreaClassification::Excluded`] when
    /// they have no residents, so zero-population placeholders never reach
    /// density computation.
    #[must_use]
    pub fn classify(&self, code: &AreaCode, population: u64) -> AreaClassification {
        if code.is_nation() {
            AreaClassification::Nation
        } else if code.is_prefecture_total() {
            AreaClassification::PrefectureTotal
        } else if self.city_totals.contains(code) {
            AreaClassification::DesignatedCityTotal
        } else if population == 0 {
            AreaClassification::Excluded
        } else if self.wards.contains_key(code) {
            AreaClassification::Ward
        } else {
            AreaClassification::OrdinaryMunicipality
        }
    }
}

/// Classifies `code` relative to `candidates`. See [`CandidateSet::classify`].
#[must_use]
pub fn classify(code: &AreaCode, population: u64, candidates: &CandidateSet) -> AreaClassification {
    candidates.classify(code, population)
}

fn is_city_total(code: &AreaCode, codes: &BTreeSet<AreaCode>) -> bool {
    code.is_designated_city_candidate()
        && has_sibling(code, codes)
        && !continues_ward_run(code, codes)
}

/// Whether another code shares the four-digit prefix of `code`. Candidates
/// end in `0`, so the siblings are exactly `code + 1 ..= code + 9`.
fn has_sibling(code: &AreaCode, codes: &BTreeSet<AreaCode>) -> bool {
    let Some(last) = AreaCode::from_value(code.value() + 9) else {
        return false;
    };
    codes
        .range((Bound::Excluded(code), Bound::Included(&last)))
        .next()
        .is_some()
}

/// Whether any of the nine codes before `code` is present in the same city
/// block, meaning `code` is the tenth, twentieth, ... ward of an earlier city.
fn continues_ward_run(code: &AreaCode, codes: &BTreeSet<AreaCode>) -> bool {
    let Some(first) = code.value().checked_sub(9).and_then(AreaCode::from_value) else {
        return false;
    };
    codes
        .range((Bound::Included(&first), Bound::Excluded(code)))
        .any(|prev| prev.city_block() == code.city_block())
}
