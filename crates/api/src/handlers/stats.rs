use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use festflow_core::stats::dataset_stats;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /stats -- counts and capacity statistics for the loaded dataset.
pub async fn get_stats(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(DataResponse {
        data: dataset_stats(&snapshot.dataset),
    }))
}
