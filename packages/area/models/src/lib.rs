#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Japanese administrative area codes and raw census rows.
//!
//! Area identity is purely the five-digit local government code used by
//! e-Stat (`PP` prefecture + `CCC` municipality). The structural role of a
//! code (nation, prefecture total, designated-city total, ward, ordinary
//! municipality) is derived from its digits plus, for designated cities,
//! the set of sibling codes present in the data. This crate only holds the
//! types; the relational classification lives in `estat_density_area`.

pub mod prefectures;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors produced when a raw string cannot be turned into an [`AreaCode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AreaCodeError {
    /// The raw value was empty after trimming.
    #[error("area code is empty")]
    Empty,

    /// The raw value contained something other than ASCII digits.
    #[error("area code '{raw}' contains non-digit characters")]
    NonDigit {
        /// The offending raw value.
        raw: String,
    },

    /// The value is not exactly five digits (after padding, where allowed).
    #[error("area code '{raw}' has {len} digits, expected {expected}", expected = AreaCode::WIDTH)]
    WrongLength {
        /// The offending raw value.
        raw: String,
        /// Number of digits found.
        len: usize,
    },
}

/// A validated five-digit administrative area code (e.g. `"14101"`).
///
/// Ordering is lexicographic, which for fixed-width digit strings is the
/// same as numeric ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaCode(String);

impl AreaCode {
    /// Number of characters in every area code.
    pub const WIDTH: usize = 5;

    /// The nation-wide total row.
    pub const NATION: &'static str = "00000";

    /// Parses an exact five-digit code. No padding is applied.
    ///
    /// # Errors
    ///
    /// Returns [`AreaCodeError`] if the value is empty, contains non-digit
    /// characters, or is not exactly five characters long.
    pub fn new(code: &str) -> Result<Self, AreaCodeError> {
        validate_digits(code)?;
        if code.len() != Self::WIDTH {
            return Err(AreaCodeError::WrongLength {
                raw: code.to_string(),
                len: code.len(),
            });
        }
        Ok(Self(code.to_string()))
    }

    /// Parses a code as it appears in source files, where numeric columns
    /// lose their leading zeros (`"1100"` for Sapporo-shi `"01100"`).
    ///
    /// Surrounding whitespace is trimmed and short codes are left-padded
    /// with zeros. Codes longer than five digits are rejected, never
    /// truncated.
    ///
    /// # Errors
    ///
    /// Returns [`AreaCodeError`] if the trimmed value is empty, contains
    /// non-digit characters, or has more than five digits.
    pub fn from_raw(raw: &str) -> Result<Self, AreaCodeError> {
        let trimmed = raw.trim();
        validate_digits(trimmed)?;
        if trimmed.len() > Self::WIDTH {
            return Err(AreaCodeError::WrongLength {
                raw: raw.to_string(),
                len: trimmed.len(),
            });
        }
        Ok(Self(format!("{trimmed:0>width$}", width = Self::WIDTH)))
    }

    /// Builds a code from its numeric value. Returns `None` above `99999`.
    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        (value < 100_000).then(|| Self(format!("{value:05}")))
    }

    /// Numeric value of the code (`"01100"` -> `1100`).
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
            .bytes()
            .fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
    }

    /// The code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit prefecture prefix (`"14"` for `"14101"`).
    #[must_use]
    pub fn prefecture(&self) -> &str {
        &self.0[..2]
    }

    /// Three-digit prefix shared by every code of a designated city block
    /// (`"141"` for Yokohama's wards).
    #[must_use]
    pub fn city_block(&self) -> &str {
        &self.0[..3]
    }

    /// Four-digit prefix shared by a designated-city total and its first
    /// nine wards (`"1410"` for `"14100"` .. `"14109"`).
    #[must_use]
    pub fn sibling_prefix(&self) -> &str {
        &self.0[..4]
    }

    /// Whether this is the nation total (`"00000"`).
    #[must_use]
    pub fn is_nation(&self) -> bool {
        self.0 == Self::NATION
    }

    /// Whether this is a prefecture total (`"PP000"`, not the nation).
    #[must_use]
    pub fn is_prefecture_total(&self) -> bool {
        self.0.ends_with("000") && !self.is_nation()
    }

    /// Digit-pattern pre-filter for designated-city totals: not a
    /// prefecture/nation total, ends in `0`, and the third digit is `1`.
    ///
    /// Matching this pattern is necessary but not sufficient; ward codes
    /// such as `"14110"` (Totsuka-ku) match it too.
    #[must_use]
    pub fn is_designated_city_candidate(&self) -> bool {
        !self.0.ends_with("000") && self.0.ends_with('0') && self.0.as_bytes()[2] == b'1'
    }
}

fn validate_digits(code: &str) -> Result<(), AreaCodeError> {
    if code.is_empty() {
        return Err(AreaCodeError::Empty);
    }
    if !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AreaCodeError::NonDigit {
            raw: code.to_string(),
        });
    }
    Ok(())
}

impl std::fmt::Display for AreaCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AreaCode {
    type Err = AreaCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for AreaCode {
    type Error = AreaCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<AreaCode> for String {
    fn from(code: AreaCode) -> Self {
        code.0
    }
}

impl AsRef<str> for AreaCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Structural role of an area code within a working set of codes.
#[derive(
    Debug,
    Clone,
    Copy,
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AreaClassification {
    /// The nation total (`00000`).
    Nation,
    /// A prefecture total (`PP000`).
    PrefectureTotal,
    /// A designated city's whole-city row whose wards are also present.
    DesignatedCityTotal,
    /// A ward of a designated city present in the working set.
    Ward,
    /// Any other municipality with residents.
    OrdinaryMunicipality,
    /// A zero-population placeholder row.
    Excluded,
}

impl AreaClassification {
    /// Whether rows of this class are safe to sum without double counting.
    #[must_use]
    pub const fn is_atomic(self) -> bool {
        matches!(self, Self::Ward | Self::OrdinaryMunicipality)
    }

    /// Whether rows of this class duplicate finer-grained rows.
    #[must_use]
    pub const fn is_redundant_parent(self) -> bool {
        matches!(
            self,
            Self::Nation | Self::PrefectureTotal | Self::DesignatedCityTotal
        )
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Nation,
            Self::PrefectureTotal,
            Self::DesignatedCityTotal,
            Self::Ward,
            Self::OrdinaryMunicipality,
            Self::Excluded,
        ]
    }
}

/// One raw row of the joined economic census / population census table.
///
/// `population` is a property of the area and period and repeats on every
/// industry row; `establishments` and `employees` are additive across
/// industries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    /// Five-digit area code.
    pub area_code: AreaCode,
    /// Display name (e.g. "横浜市鶴見区").
    pub area_name: String,
    /// Industry classification code, never zero-padded (`"A"`, `"030"`, `"2700"`).
    pub industry_code: String,
    /// Industry display name.
    pub industry_name: String,
    /// Number of establishments.
    pub establishments: u64,
    /// Number of employees.
    pub employees: u64,
    /// Resident population of the area.
    pub population: u64,
    /// Survey vintage key (`""` when the source carries a single period).
    pub time_period: String,
}
