use axum::routing::post;
use axum::Router;

use crate::handlers::dataset;
use crate::state::AppState;

/// Dataset management routes mounted at `/dataset`.
pub fn router() -> Router<AppState> {
    Router::new().route("/reload", post(dataset::reload_dataset))
}
