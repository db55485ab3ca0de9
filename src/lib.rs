//! Machining ledger library
//!
//! Production records and employee wages kept in a pluggable record store,
//! with machine-time and per-order labor-cost rollups served over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod dashboard;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod reports;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{
    http::HeaderValue,
    response::Json,
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};

use crate::services::LedgerService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerService,
    pub config: config::AppConfig,
}

impl AppState {
    pub fn new(ledger: LedgerService, config: config::AppConfig) -> Self {
        Self { ledger, config }
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}


/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Routes mounted under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    let production_records = Router::new().route(
        "/",
        get(handlers::production_records::list_production_records)
            .post(handlers::production_records::create_production_record),
    );

    let wages = Router::new().route(
        "/",
        get(handlers::wages::list_wages).put(handlers::wages::upsert_wage),
    );

    let reports = Router::new()
        .route("/machine-time", get(handlers::reports::machine_time_report))
        .route("/order-costs", get(handlers::reports::order_cost_report))
        .route("/filter-options", get(handlers::reports::filter_options));

    Router::new()
        .route("/status", get(api_status))
        .nest("/production-records", production_records)
        .nest("/wages", wages)
        .route("/persons", get(handlers::production_records::list_persons))
        .nest("/reports", reports)
}

/// CORS policy from configuration.
///
/// Returns `None` when no origins are configured and permissive CORS is not
/// allowed for this environment.
pub fn cors_layer(cfg: &config::AppConfig) -> Option<CorsLayer> {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        Some(CorsLayer::permissive())
    } else {
        None
    }
}

/// Full application router: health probes, the v1 API and the shared layers.
pub fn app(state: AppState) -> Router {
    let mut router = Router::<AppState>::new()
        .route("/", get(|| async { "machining-ledger up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new());

    if let Some(cors) = cors_layer(&state.config) {
        router = router.layer(cors);
    }

    router
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}

async fn api_status(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "machining-ledger",
        "store_backend": state.ledger.backend().to_string(),
        "environment": state.config.environment,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}
