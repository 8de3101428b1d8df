pub mod analysis;
pub mod dataset;
pub mod events;
pub mod health;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /events                          list (?skip=&limit=)
/// /events/search                   filtered list
/// /events/{event_id}               attendance + stop allocations (?max_distance_m=)
///
/// /stats                           dataset statistics
///
/// /analysis/venues                 scored records
/// /analysis/allocations            per-record stop allocations
/// /analysis/peak-flows             inflow/outflow bins
/// /analysis/recommendations        tiered recommendations (?tier=)
///
/// /dataset/reload                  reload sources and swap (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/events", events::router())
        .route("/stats", get(handlers::stats::get_stats))
        .nest("/analysis", analysis::router())
        .nest("/dataset", dataset::router())
}
