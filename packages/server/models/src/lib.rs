#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the density server.
//!
//! Query parameters arrive as loosely-typed strings and numbers; the server
//! turns them into a validated `DensityQuery`, filling gaps from the
//! configured display defaults.

use serde::{Deserialize, Serialize};

/// Query parameters for `GET /api/density`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityQueryParams {
    /// `"00"` for the nation, or a prefecture code or name.
    pub scope: Option<String>,
    /// Industry code, or the all-industries sentinel.
    pub industry: Option<String>,
    /// Rows below this population are hidden from the ranking.
    pub population_floor: Option<u64>,
    /// Maximum number of ranked rows.
    pub limit: Option<usize>,
    /// `establishmentDensity`/`est` or `employmentDensity`/`emp`.
    pub sort_by: Option<String>,
    /// Survey period; latest when omitted.
    pub period: Option<String>,
}

/// Query parameters for endpoints that only select a survey period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodQueryParams {
    /// Survey period; latest when omitted.
    pub period: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_params_are_camel_case() {
        let params: DensityQueryParams = serde_json::from_str(
            r#"{"scope":"14","populationFloor":1000,"limit":10,"sortBy":"emp"}"#,
        )
        .unwrap();
        assert_eq!(params.scope.as_deref(), Some("14"));
        assert_eq!(params.population_floor, Some(1000));
        assert_eq!(params.limit, Some(10));
        assert_eq!(params.sort_by.as_deref(), Some("emp"));
        assert_eq!(params.industry, None);
        assert_eq!(params.period, None);
    }

    #[test]
    fn health_serializes() {
        let json = serde_json::to_value(ApiHealth {
            healthy: true,
            version: "0.1.0".to_string(),
        })
        .unwrap();
        assert_eq!(json["healthy"], true);
        assert_eq!(json["version"], "0.1.0");
    }
}
