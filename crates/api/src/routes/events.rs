use axum::routing::get;
use axum::Router;

use crate::handlers::events;
use crate::state::AppState;

/// Event routes mounted at `/events`.
///
/// ```text
/// GET /                -> list_events
/// GET /search          -> search_events
/// GET /{event_id}      -> get_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(events::list_events))
        .route("/search", get(events::search_events))
        .route("/{event_id}", get(events::get_event))
}
