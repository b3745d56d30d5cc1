#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic reconciliation of e-Stat area codes.
//!
//! Raw census tables mix the nation total, prefecture totals, designated
//! city totals, and the wards those city totals are made of. Summing them
//! naively double counts every ward-bearing city. [`classify`] determines
//! the structural role of each code relative to the codes actually
//! present, and [`dedupe`] keeps only the atomic municipal units.

pub mod classify;
pub mod dedupe;

pub use classify::{CandidateSet, classify};
pub use dedupe::{DedupeOutcome, dedupe, dedupe_with_report};
