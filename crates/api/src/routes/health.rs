use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the database is reachable.
    pub db_healthy: bool,
    /// Whether both reference CSVs produced data.
    pub master_data_loaded: bool,
}

/// GET /health -- returns service, database and master data health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = hanami_db::health_check(&state.pool).await.is_ok();
    let master_data_loaded =
        !state.bloom.calendar().is_empty() && !state.bloom.offsets().is_empty();

    let status = if db_healthy && master_data_loaded {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        master_data_loaded,
    })
}

/// Mount health check routes (root level, NOT under `/annotation_api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
