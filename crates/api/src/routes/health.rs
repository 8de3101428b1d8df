use axum::extract::State;
use axum::{routing::get, Json, Router};
use festflow_core::types::Timestamp;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Performances in the current dataset.
    pub performances: usize,
    /// Transit stops in the current dataset.
    pub stops: usize,
    pub loaded_at: Timestamp,
}

/// GET /health -- service status and dataset size.
///
/// Reports `degraded` when either events or stops are empty.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let snapshot = state.store.snapshot().await;
    let performances = snapshot.dataset.records().len();
    let stops = snapshot.dataset.stops().len();

    let status = if performances > 0 && stops > 0 {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        performances,
        stops,
        loaded_at: snapshot.dataset.loaded_at(),
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
