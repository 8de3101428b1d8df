use axum::routing::get;
use axum::Router;

use crate::handlers::analysis;
use crate::state::AppState;

/// Analysis routes mounted at `/analysis`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/venues", get(analysis::list_venues))
        .route("/allocations", get(analysis::list_allocations))
        .route("/peak-flows", get(analysis::list_peak_flows))
        .route("/recommendations", get(analysis::list_recommendations))
}
