//! Underserved Zone Index (UZI).
//!
//! ```text
//! avg_buses_per_hour = stops_nearby * mean_service_frequency
//! uzi_raw            = attendance / (stops_nearby * avg_buses_per_hour + 1e-9)
//! uzi                = uzi_raw * (1 + (4 - ranking_level) * 0.25)
//! uzi_normalized     = (uzi - min) / (max - min, or 1 when equal)
//! ```
//!
//! Normalization is relative to the batch being scored. A venue with no
//! stops in range gets a huge but finite raw score and so tops the batch.

use serde::Serialize;

use crate::distribution::stops_within;
use crate::frequency::{mean_service_frequency, FrequencySource};
use crate::model::TransitStop;
use crate::types::GeoPoint;

/// Keeps the denominator non-zero for venues without stops.
pub const UZI_EPSILON: f64 = 1e-9;
/// Boost added per ranking level above the lowest (4).
pub const PRIORITY_BOOST_STEP: f64 = 0.25;

/// Transit supply around one venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceCoverage {
    pub stops_nearby: usize,
    pub avg_buses_per_hour: f64,
}

/// Per-record input to batch scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UziInput {
    pub estimated_attendance: f64,
    pub coverage: ServiceCoverage,
    pub ranking_level: i32,
}

/// Per-record scoring result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UziScore {
    pub uzi_raw: f64,
    pub priority_boost: f64,
    pub uzi: f64,
    pub uzi_normalized: f64,
}

/// Count the stops within `radius_m` of `venue` and derive their hourly service.
pub fn coverage(
    venue: GeoPoint,
    stops: &[TransitStop],
    radius_m: f64,
    frequency: &dyn FrequencySource,
    fallback_frequency: f64,
) -> ServiceCoverage {
    let nearby: Vec<&TransitStop> = stops_within(venue, stops, radius_m)
        .map(|(s, _)| s)
        .collect();
    let mean = mean_service_frequency(nearby.iter().copied(), frequency, fallback_frequency);
    ServiceCoverage {
        stops_nearby: nearby.len(),
        avg_buses_per_hour: nearby.len() as f64 * mean,
    }
}

/// Demand-to-supply ratio before the priority boost.
pub fn raw_uzi(estimated_attendance: f64, coverage: &ServiceCoverage) -> f64 {
    estimated_attendance / (coverage.stops_nearby as f64 * coverage.avg_buses_per_hour + UZI_EPSILON)
}

/// `1 + (4 - ranking_level) * 0.25`.
pub fn priority_boost(ranking_level: i32) -> f64 {
    1.0 + (4.0 - f64::from(ranking_level)) * PRIORITY_BOOST_STEP
}

/// Min-max normalize `values` into `[0, 1]`.
///
/// When every value is equal the range is taken as 1, so all map to 0.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = if max - min > 0.0 { max - min } else { 1.0 };
    values.iter().map(|v| (v - min) / range).collect()
}

/// Score a whole batch. Output order matches input order; an empty batch
/// yields an empty result.
pub fn score_batch(inputs: &[UziInput]) -> Vec<UziScore> {
    let partial: Vec<(f64, f64, f64)> = inputs
        .iter()
        .map(|i| {
            let raw = raw_uzi(i.estimated_attendance, &i.coverage);
            let boost = priority_boost(i.ranking_level);
            (raw, boost, raw * boost)
        })
        .collect();

    let uzis: Vec<f64> = partial.iter().map(|(_, _, u)| *u).collect();
    normalize(&uzis)
        .into_iter()
        .zip(partial)
        .map(|(uzi_normalized, (uzi_raw, priority_boost, uzi))| UziScore {
            uzi_raw,
            priority_boost,
            uzi,
            uzi_normalized,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{MeasuredFrequency, NoServiceData};
    use crate::test_support::{north_of, stop, VENUE};

    fn input(attendance: f64, stops: usize, level: i32) -> UziInput {
        UziInput {
            estimated_attendance: attendance,
            coverage: ServiceCoverage {
                stops_nearby: stops,
                avg_buses_per_hour: stops as f64 * 4.0,
            },
            ranking_level: level,
        }
    }

    // -- coverage --

    #[test]
    fn coverage_counts_stops_in_radius_with_fallback_frequency() {
        let stops = vec![
            stop("a", north_of(VENUE, 50.0)),
            stop("b", north_of(VENUE, 350.0)),
            stop("c", north_of(VENUE, 900.0)),
        ];
        let c = coverage(VENUE, &stops, 400.0, &NoServiceData, 4.0);
        assert_eq!(c.stops_nearby, 2);
        assert!((c.avg_buses_per_hour - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coverage_uses_measured_frequency() {
        let mut a = stop("a", north_of(VENUE, 50.0));
        a.buses_per_hour = Some(12.0);
        let c = coverage(VENUE, &[a], 400.0, &MeasuredFrequency, 4.0);
        assert_eq!(c.stops_nearby, 1);
        assert!((c.avg_buses_per_hour - 12.0).abs() < f64::EPSILON);
    }

    // -- raw_uzi / priority_boost --

    #[test]
    fn raw_uzi_divides_by_squared_supply() {
        // 2 stops * 8 buses/h = 16
        let c = ServiceCoverage {
            stops_nearby: 2,
            avg_buses_per_hour: 8.0,
        };
        assert!((raw_uzi(160.0, &c) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn zero_stops_dominates_but_stays_finite() {
        let c = ServiceCoverage {
            stops_nearby: 0,
            avg_buses_per_hour: 0.0,
        };
        let raw = raw_uzi(100.0, &c);
        assert!(raw.is_finite());
        assert!(raw > 1e10);
    }

    #[test]
    fn priority_boost_by_level() {
        assert!((priority_boost(1) - 1.75).abs() < f64::EPSILON);
        assert!((priority_boost(3) - 1.25).abs() < f64::EPSILON);
        assert!((priority_boost(4) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_boost_handles_extreme_levels() {
        let high = priority_boost(i32::MIN);
        let low = priority_boost(i32::MAX);
        assert!(high.is_finite() && high > 1.75);
        assert!(low.is_finite() && low < 0.0);
    }

    // -- normalize / score_batch --

    #[test]
    fn normalized_range_spans_zero_to_one() {
        let scores = score_batch(&[input(400.0, 1, 3), input(800.0, 2, 1), input(100.0, 3, 4)]);
        let min = scores.iter().map(|s| s.uzi_normalized).fold(f64::INFINITY, f64::min);
        let max = scores.iter().map(|s| s.uzi_normalized).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
        for s in &scores {
            assert!((0.0..=1.0).contains(&s.uzi_normalized));
        }
    }

    #[test]
    fn equal_scores_all_map_to_zero() {
        let scores = score_batch(&[input(400.0, 2, 2), input(400.0, 2, 2)]);
        assert!(scores.iter().all(|s| s.uzi_normalized == 0.0));
    }

    #[test]
    fn single_record_maps_to_zero() {
        let scores = score_batch(&[input(400.0, 2, 2)]);
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].uzi_normalized, 0.0);
    }

    #[test]
    fn empty_batch_is_empty() {
        assert!(score_batch(&[]).is_empty());
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn uncovered_venue_tops_the_batch() {
        let scores = score_batch(&[input(50.0, 0, 4), input(5000.0, 1, 1)]);
        assert_eq!(scores[0].uzi_normalized, 1.0);
        assert_eq!(scores[1].uzi_normalized, 0.0);
    }

    #[test]
    fn boost_is_applied_before_normalizing() {
        let scores = score_batch(&[input(100.0, 1, 1), input(100.0, 1, 4)]);
        assert!((scores[0].uzi - scores[0].uzi_raw * 1.75).abs() < 1e-9);
        assert_eq!(scores[0].uzi_normalized, 1.0);
        assert_eq!(scores[1].uzi_normalized, 0.0);
    }
}
