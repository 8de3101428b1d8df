//! Service-frequency capability.
//!
//! The UZI scorer asks a [`FrequencySource`] how many buses per hour call at
//! each nearby stop. Live timetable lookups implement this trait outside the
//! core; [`NoServiceData`] is the deterministic offline fallback.

use crate::model::TransitStop;

/// Answers "how many buses per hour serve this stop?".
pub trait FrequencySource: Send + Sync {
    /// `None` means the source has no data for this stop.
    fn buses_per_hour(&self, stop: &TransitStop) -> Option<f64>;
}

/// Reads the frequency carried on the stop record itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasuredFrequency;

impl FrequencySource for MeasuredFrequency {
    fn buses_per_hour(&self, stop: &TransitStop) -> Option<f64> {
        stop.buses_per_hour.filter(|v| v.is_finite() && *v >= 0.0)
    }
}

/// Knows nothing; every stop falls back to the configured constant.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoServiceData;

impl FrequencySource for NoServiceData {
    fn buses_per_hour(&self, _stop: &TransitStop) -> Option<f64> {
        None
    }
}

/// Mean buses per hour across `stops`, over the stops the source has data
/// for. Falls back to `fallback` when none of them do.
pub fn mean_service_frequency<'a>(
    stops: impl IntoIterator<Item = &'a TransitStop>,
    source: &dyn FrequencySource,
    fallback: f64,
) -> f64 {
    let (sum, count) = stops
        .into_iter()
        .filter_map(|s| source.buses_per_hour(s))
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        fallback
    } else {
        sum / count as f64
    }
}
