use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::time::Instant;

use super::AppState;

/// Liveness probe; never touches the record store.
async fn liveness_check() -> impl IntoResponse {
    Json(json!({
        "status": "up",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness probe: one round trip to the configured record store.
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let backend = state.ledger.backend().to_string();
    let result = state.ledger.check_store().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": {
                    "store": { "status": "up", "backend": backend, "latency_ms": latency_ms }
                }
            })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, %backend, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "checks": {
                        "store": { "status": "down", "backend": backend, "error": err.to_string() }
                    }
                })),
            )
        }
    }
}

/// Health routes, mounted at `/health`.
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(liveness_check))
        .route("/ready", get(readiness_check))
}
