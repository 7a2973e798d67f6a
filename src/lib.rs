pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{extract_service::ExtractService, mcq_service::McqService};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub mcq_service: McqService,
    pub extract_service: ExtractService,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_services(
            McqService::from_config(config, http_client),
            ExtractService::default(),
        ))
    }

    pub fn with_services(mcq_service: McqService, extract_service: ExtractService) -> Self {
        Self {
            mcq_service,
            extract_service,
        }
    }
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let mcq_api = Router::new()
        .route("/api/mcq/generate", post(routes::mcq::generate_from_upload))
        .route("/api/mcq/generate-text", post(routes::mcq::generate_from_text))
        .route("/api/mcq/status", get(routes::mcq::service_status))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::RateLimiter::per_second(config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(mcq_api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(config.max_upload_mb * 1024 * 1024))
}
