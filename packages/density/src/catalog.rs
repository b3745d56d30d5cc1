//! Selector catalogs derived from the loaded dataset.

use std::collections::BTreeMap;

use estat_density_area_models::prefectures;
use estat_density_dataset::Dataset;
use estat_density_models::{ALL_INDUSTRIES, ALL_INDUSTRIES_NAME, IndustryInfo, PrefectureInfo};

/// Prefectures present in the data, by code.
///
/// Names come from the data's prefecture-total rows when present, else
/// from the JIS X 0401 table.
#[must_use]
pub fn prefectures(dataset: &Dataset) -> Vec<PrefectureInfo> {
    let mut found: BTreeMap<&str, Option<&str>> = BTreeMap::new();

    for record in dataset.records() {
        let code = &record.area_code;
        if code.is_nation() {
            continue;
        }
        let name = found.entry(code.prefecture()).or_default();
        if name.is_none() && code.is_prefecture_total() && !record.area_name.is_empty() {
            *name = Some(record.area_name.as_str());
        }
    }

    found
        .into_iter()
        .map(|(code, name)| PrefectureInfo {
            code: code.to_string(),
            name: name
                .or_else(|| prefectures::prefecture_name(code))
                .unwrap_or(code)
                .to_string(),
        })
        .collect()
}

/// Industries present in the data, with the combined selection first.
///
/// Numeric codes sort by value ahead of alphabetic ones, which sort
/// lexicographically. The first name seen for a code wins.
#[must_use]
pub fn industries(dataset: &Dataset) -> Vec<IndustryInfo> {
    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for record in dataset.records() {
        names
            .entry(record.industry_code.as_str())
            .or_insert(record.industry_name.as_str());
    }

    let mut codes: Vec<(&str, &str)> = names.into_iter().collect();
    codes.sort_by(|a, b| sort_key(a.0).cmp(&sort_key(b.0)));

    std::iter::once(IndustryInfo {
        code: ALL_INDUSTRIES.to_string(),
        name: ALL_INDUSTRIES_NAME.to_string(),
    })
    .chain(codes.into_iter().map(|(code, name)| IndustryInfo {
        code: code.to_string(),
        name: name.to_string(),
    }))
    .collect()
}

fn sort_key(code: &str) -> (bool, u64, &str) {
    code.parse::<u64>()
        .map_or((true, 0, code), |value| (false, value, code))
}

/// Survey periods present in the data, ascending.
#[must_use]
pub fn periods(dataset: &Dataset) -> Vec<String> {
    dataset.periods().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{record, sample};

    #[test]
    fn prefecture_names_prefer_data() {
        let mut rows = sample();
        for row in &mut rows {
            if row.area_code.as_str() == "14000" {
                row.area_name = "神奈川".to_string();
            }
        }
        let catalog = prefectures(&Dataset::from_records(rows));
        assert_eq!(
            catalog,
            [
                PrefectureInfo {
                    code: "13".to_string(),
                    name: "area 13000".to_string(),
                },
                PrefectureInfo {
                    code: "14".to_string(),
                    name: "神奈川".to_string(),
                },
            ]
        );
    }

    #[test]
    fn prefecture_names_fall_back_to_table() {
        let catalog = prefectures(&Dataset::from_records(vec![record("27201", "A", 1, 1, 1)]));
        assert_eq!(catalog[0].name, "大阪府");
    }

    #[test]
    fn industries_sorted_with_total_first() {
        let rows = vec![
            record("14201", "10", 1, 1, 1),
            record("14201", "9", 1, 1, 1),
            record("14201", "E", 1, 1, 1),
            record("14201", "A", 1, 1, 1),
            record("14202", "9", 1, 1, 1),
        ];
        let codes: Vec<String> = industries(&Dataset::from_records(rows))
            .into_iter()
            .map(|i| i.code)
            .collect();
        assert_eq!(codes, [ALL_INDUSTRIES, "9", "10", "A", "E"]);
    }

    #[test]
    fn periods_ascending() {
        let mut later = record("14201", "A", 1, 1, 1);
        later.time_period = "2016".to_string();
        let dataset = Dataset::from_records(vec![later, record("14201", "A", 1, 1, 1)]);
        assert_eq!(periods(&dataset), ["2014", "2016"]);
    }
}
