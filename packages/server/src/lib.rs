#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for reconciled density rankings.
//!
//! Serves a read-only JSON API over the joined census dataset: selector
//! catalogs, ranked density reports per scope and industry, and an
//! inspection listing of how area codes were classified. The dataset is
//! loaded once at startup and shared by every worker; reports are memoised
//! per query.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use estat_density::DensityEngine;
use estat_density_config::{DisplaySettings, Settings};
use estat_density_dataset::DatasetError;

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The dataset could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
pub struct AppState {
    /// Memoising query engine over the process-wide dataset.
    pub engine: DensityEngine<'static>,
    /// Defaults for query parameters a request leaves out.
    pub display: DisplaySettings,
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/prefectures", web::get().to(handlers::prefectures))
            .route("/industries", web::get().to(handlers::industries))
            .route("/periods", web::get().to(handlers::periods))
            .route("/density", web::get().to(handlers::density))
            .route("/areas/{prefix}", web::get().to(handlers::areas)),
    );
}

/// Loads the dataset named in `settings` and serves the API until
/// shutdown. The caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset cannot be loaded or the HTTP
/// server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(settings: Settings) -> Result<(), ServerError> {
    let dataset = estat_density_dataset::global(&settings.dataset.path)?;
    if dataset.is_empty() {
        log::warn!("Dataset {} has no usable rows", settings.dataset.path.display());
    }

    let state = web::Data::new(AppState {
        engine: DensityEngine::new(dataset, settings.server.cache_capacity),
        display: settings.display,
    });

    let bind_addr = settings.server.bind_addr;
    let port = settings.server.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}
