//! Shared query parameter types for API handlers.

use serde::Deserialize;

/// Listing parameters (`?skip=&limit=`).
///
/// Values are clamped in `festflow_core::search` via `clamp_limit` /
/// `clamp_offset`.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

/// Radius override for the single-event demand view.
#[derive(Debug, Default, Deserialize)]
pub struct DemandParams {
    pub max_distance_m: Option<f64>,
}

/// Comma-separated tier filter, e.g. `?tier=critical,high`.
#[derive(Debug, Default, Deserialize)]
pub struct TierParams {
    pub tier: Option<String>,
}
