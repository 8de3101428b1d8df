//! Handlers exposing the precomputed pipeline tables.
//!
//! Tables are computed once per load, so these only read the current
//! snapshot.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use festflow_core::recommendation::RecommendationTier;

use crate::error::{AppError, AppResult};
use crate::query::TierParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /analysis/venues -- scored records (UZI table).
pub async fn list_venues(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(DataResponse {
        data: snapshot.output.venues.clone(),
    }))
}

/// GET /analysis/allocations -- per-record stop allocations.
pub async fn list_allocations(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(DataResponse {
        data: snapshot.output.allocations.clone(),
    }))
}

/// GET /analysis/peak-flows -- inflow/outflow time bins.
pub async fn list_peak_flows(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let snapshot = state.store.snapshot().await;
    Ok(Json(DataResponse {
        data: snapshot.output.peak_flows.clone(),
    }))
}

/// GET /analysis/recommendations -- most severe first.
///
/// Without `tier`, Low is omitted.
pub async fn list_recommendations(
    State(state): State<AppState>,
    Query(params): Query<TierParams>,
) -> AppResult<impl IntoResponse> {
    let tiers = parse_tiers(params.tier.as_deref())?;
    let snapshot = state.store.snapshot().await;

    let mut recs: Vec<_> = snapshot
        .output
        .recommendations
        .iter()
        .filter(|r| match &tiers {
            Some(wanted) => wanted.contains(&r.tier),
            None => r.tier != RecommendationTier::Low,
        })
        .cloned()
        .collect();
    recs.sort_by(|a, b| b.tier.cmp(&a.tier));

    Ok(Json(DataResponse { data: recs }))
}

fn parse_tiers(raw: Option<&str>) -> AppResult<Option<Vec<RecommendationTier>>> {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<RecommendationTier>()
                .map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .collect::<AppResult<Vec<_>>>()
        .map(Some)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn tier_filter_parsing() {
        assert_eq!(parse_tiers(None).unwrap(), None);
        assert_eq!(parse_tiers(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_tiers(Some("critical, High")).unwrap(),
            Some(vec![RecommendationTier::Critical, RecommendationTier::High])
        );
        assert_matches!(parse_tiers(Some("urgent")), Err(AppError::BadRequest(_)));
    }
}
