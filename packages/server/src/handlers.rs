//! HTTP handler functions for the density API.

use actix_web::{HttpResponse, web};
use estat_density::{DensityError, catalog, verify};
use estat_density_config::DisplaySettings;
use estat_density_models::{DensityQuery, IndustrySelection, Metric, Scope};
use estat_density_server_models::{ApiHealth, DensityQueryParams, PeriodQueryParams};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/prefectures`
pub async fn prefectures(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(catalog::prefectures(state.engine.dataset()))
}

/// `GET /api/industries`
///
/// The all-industries sentinel is listed first.
pub async fn industries(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(catalog::industries(state.engine.dataset()))
}

/// `GET /api/periods`
pub async fn periods(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(catalog::periods(state.engine.dataset()))
}

/// `GET /api/density`
///
/// Ranked density report for a scope and industry. Missing parameters fall
/// back to the configured display defaults.
pub async fn density(
    state: web::Data<AppState>,
    params: web::Query<DensityQueryParams>,
) -> HttpResponse {
    let query = match build_query(params.into_inner(), &state.display) {
        Ok(query) => query,
        Err(message) => return bad_request(&message),
    };

    match state.engine.report(&query) {
        Ok(report) => HttpResponse::Ok().json(report.as_ref()),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/areas/{prefix}`
///
/// Classification of every area code under `prefix`.
pub async fn areas(
    state: web::Data<AppState>,
    prefix: web::Path<String>,
    params: web::Query<PeriodQueryParams>,
) -> HttpResponse {
    match verify::inspect(state.engine.dataset(), &prefix, params.period.as_deref()) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => error_response(&e),
    }
}

fn build_query(params: DensityQueryParams, display: &DisplaySettings) -> Result<DensityQuery, String> {
    let scope: Scope = params
        .scope
        .as_deref()
        .unwrap_or(Scope::NATION_CODE)
        .parse::<Scope>()
        .map_err(|e| e.to_string())?;

    let sort_by = match params.sort_by.as_deref() {
        Some(raw) => raw
            .parse::<Metric>()
            .map_err(|_| format!("unknown sortBy '{raw}'"))?,
        None => display.metric,
    };

    Ok(DensityQuery {
        scope,
        industry: params
            .industry
            .map_or(IndustrySelection::All, IndustrySelection::from),
        population_floor: params.population_floor.unwrap_or(display.population_floor),
        limit: params.limit.unwrap_or(display.limit),
        sort_by,
        time_period: params.period.filter(|p| !p.trim().is_empty()),
    })
}

fn bad_request(message: &str) -> HttpResponse {
    log::debug!("Rejected request: {message}");
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

fn error_response(error: &DensityError) -> HttpResponse {
    match error {
        DensityError::InvalidQuery { .. } => bad_request(&error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use estat_density::DensityEngine;
    use estat_density_area_models::{AreaCode, AreaRecord};
    use estat_density_dataset::Dataset;

    use super::*;

    fn record(code: &str, industry: &str, establishments: u64, population: u64) -> AreaRecord {
        AreaRecord {
            area_code: AreaCode::new(code).unwrap(),
            area_name: format!("area {code}"),
            industry_code: industry.to_string(),
            industry_name: format!("industry {industry}"),
            establishments,
            employees: establishments * 10,
            population,
            time_period: "2014".to_string(),
        }
    }

    fn state() -> web::Data<AppState> {
        let rows = vec![
            record("14000", "A", 999, 600_000),
            record("14100", "A", 999, 500_000),
            record("14101", "A", 100, 200_000),
            record("14102", "A", 90, 300_000),
            record("14201", "A", 40, 100_000),
            record("13201", "A", 300, 300_000),
            record("13201", "B", 50, 300_000),
        ];
        let dataset: &'static Dataset = Box::leak(Box::new(Dataset::from_records(rows)));
        web::Data::new(AppState {
            engine: DensityEngine::new(dataset, 8),
            display: DisplaySettings {
                population_floor: 0,
                ..DisplaySettings::default()
            },
        })
    }

    #[actix_rt::test]
    async fn health_endpoint() {
        let app = test::init_service(App::new().configure(crate::configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
    }

    #[actix_rt::test]
    async fn density_endpoint_uses_defaults() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::get().uri("/api/density").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(body["summary"]["totalPopulation"], 900_000);
        assert_eq!(body["query"]["scope"], "00");
        assert_eq!(body["query"]["sortBy"], "establishmentDensity");
        assert_eq!(body["timePeriod"], "2014");
    }

    #[actix_rt::test]
    async fn density_endpoint_scope_and_industry() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .configure(crate::configure),
        )
        .await;
        let req = test::TestRequest::get()
            .uri("/api/density?scope=14&industry=A&limit=1&sortBy=emp")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        let rows = body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(body["matchingRows"], 3);
        assert_eq!(rows[0]["areaCode"], "14101");
        // ranked nationally: 13201 is denser for industry A
        assert_eq!(rows[0]["estRank"], 2);
    }

    #[actix_rt::test]
    async fn invalid_queries_are_bad_requests() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .configure(crate::configure),
        )
        .await;

        for uri in [
            "/api/density?scope=99",
            "/api/density?limit=0",
            "/api/density?sortBy=sales",
            "/api/areas/14x",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "{uri}");
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string(), "{uri}");
        }
    }

    #[actix_rt::test]
    async fn catalogs_and_inspection() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/industries").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["code"], estat_density_models::ALL_INDUSTRIES);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let req = test::TestRequest::get().uri("/api/prefectures").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["code"], "13");
        assert_eq!(body[0]["name"], "東京都");
        assert_eq!(body[1]["name"], "area 14000");

        let req = test::TestRequest::get().uri("/api/periods").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!(["2014"]));

        let req = test::TestRequest::get().uri("/api/areas/141").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["areas"][0]["classification"], "DESIGNATED_CITY_TOTAL");
        assert_eq!(body["cityTotals"][0]["wardPopulation"], 500_000);
    }
}
