//! Handlers for event listing, search and single-event demand.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use festflow_core::pipeline::event_demand;
use festflow_core::search::{self, EventQuery};

use crate::error::AppResult;
use crate::query::{DemandParams, PaginationParams};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /events
// ---------------------------------------------------------------------------

/// Page through every performance in load order.
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    let items = search::list_events(snapshot.dataset.records(), params.skip, params.limit);
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// GET /events/search
// ---------------------------------------------------------------------------

/// Filter performances by text, venue, town, category, date and capacity.
pub async fn search_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    let items = search::search_events(snapshot.dataset.records(), &query)?;
    Ok(Json(DataResponse { data: items }))
}

// ---------------------------------------------------------------------------
// GET /events/{event_id}
// ---------------------------------------------------------------------------

/// Expected attendance and per-stop allocation for one event.
///
/// Uses the event's first performance. `max_distance_m` overrides the
/// configured stop radius.
pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    Query(params): Query<DemandParams>,
) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    let record = snapshot.dataset.find_event(&event_id)?;
    let demand = event_demand(
        record,
        snapshot.dataset.stops(),
        &state.pipeline_config,
        params.max_distance_m,
    )?;
    Ok(Json(DataResponse { data: demand }))
}
