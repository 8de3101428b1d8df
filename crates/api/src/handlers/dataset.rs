use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use festflow_core::types::Timestamp;
use serde::Serialize;

use crate::error::AppResult;
use crate::loader::load_snapshot;
use crate::response::DataResponse;
use crate::state::AppState;

/// Summary of a completed reload.
#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub performances: usize,
    pub stops: usize,
    pub scored: usize,
    pub excluded_without_coordinates: usize,
    pub loaded_at: Timestamp,
    pub previous_loaded_at: Timestamp,
}

/// POST /dataset/reload -- rebuild from the configured sources and swap.
///
/// In-flight requests keep the snapshot they started with.
pub async fn reload_dataset(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = load_snapshot(&state.data_config, &state.pipeline_config).await?;
    let performances = snapshot.dataset.records().len();
    let stops = snapshot.dataset.stops().len();
    let scored = snapshot.output.venues.len();
    let excluded_without_coordinates = snapshot.output.excluded_without_coordinates;
    let loaded_at = snapshot.dataset.loaded_at();

    let previous = state.store.replace(snapshot).await;
    tracing::info!(performances, stops, "Dataset reloaded");

    Ok(Json(DataResponse {
        data: ReloadSummary {
            performances,
            stops,
            scored,
            excluded_without_coordinates,
            loaded_at,
            previous_loaded_at: previous.dataset.loaded_at(),
        },
    }))
}
