//! Distribute expected attendance across nearby stops by distance weight.
//!
//! Each stop within the radius gets `w = 1 / (1 + distance_km * 3)`; its
//! share of the total weight, floored to whole passengers, is its
//! allocation. Floor rounding may leave the total a few passengers short of
//! the attendance; that deficit is reported, not redistributed.

use serde::Serialize;

use crate::distance::distance_m;
use crate::model::TransitStop;
use crate::types::GeoPoint;

/// Weight decay per kilometer of distance.
pub const DISTANCE_DECAY_PER_KM: f64 = 3.0;

/// One stop's slice of a venue's attendance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopAllocation {
    pub stop_id: String,
    pub stop_name: String,
    pub locality: String,
    pub lat: f64,
    pub lon: f64,
    pub services: Vec<String>,
    pub distance_meters: f64,
    pub distance_weight: f64,
    pub allocated_passengers: u64,
    /// Share of the total weight as a percentage, one decimal place.
    pub share_of_total: f64,
}

/// Allocation result for one venue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub expected_attendance: f64,
    pub total_allocated: u64,
    /// Ordered by `allocated_passengers`, highest first; ties keep stop order.
    pub allocations: Vec<StopAllocation>,
}

/// Inverse-distance weight for a stop `distance_m` meters away.
pub fn distance_weight(distance_m: f64) -> f64 {
    1.0 / (1.0 + (distance_m / 1000.0) * DISTANCE_DECAY_PER_KM)
}

/// Stops within `radius_m` (inclusive) of `venue`, with their distance, in
/// input order.
pub fn stops_within<'a>(
    venue: GeoPoint,
    stops: &'a [TransitStop],
    radius_m: f64,
) -> impl Iterator<Item = (&'a TransitStop, f64)> + 'a {
    stops
        .iter()
        .map(move |s| (s, distance_m(venue, s.location())))
        .filter(move |(_, d)| *d <= radius_m)
}

/// Allocate `expected_attendance` across the stops within `radius_m` of `venue`.
pub fn distribute(
    venue: GeoPoint,
    expected_attendance: f64,
    stops: &[TransitStop],
    radius_m: f64,
) -> Distribution {
    let nearby: Vec<(&TransitStop, f64, f64)> = stops_within(venue, stops, radius_m)
        .map(|(s, d)| (s, d, distance_weight(d)))
        .collect();

    let total_weight: f64 = nearby.iter().map(|(_, _, w)| w).sum();
    if nearby.is_empty() || total_weight <= 0.0 {
        return Distribution {
            expected_attendance,
            total_allocated: 0,
            allocations: Vec::new(),
        };
    }

    let mut allocations: Vec<StopAllocation> = nearby
        .into_iter()
        .map(|(stop, distance, weight)| {
            let share = weight / total_weight;
            StopAllocation {
                stop_id: stop.stop_id.clone(),
                stop_name: stop.name.clone(),
                locality: stop.locality.clone(),
                lat: stop.lat,
                lon: stop.lon,
                services: stop.services.clone(),
                distance_meters: distance,
                distance_weight: weight,
                allocated_passengers: (expected_attendance.max(0.0) * share).floor() as u64,
                share_of_total: (share * 1000.0).round() / 10.0,
            }
        })
        .collect();

    // `sort_by` is stable, so equal allocations keep input order.
    allocations.sort_by(|a, b| b.allocated_passengers.cmp(&a.allocated_passengers));

    let total_allocated = allocations.iter().map(|a| a.allocated_passengers).sum();
    Distribution {
        expected_attendance,
        total_allocated,
        allocations,
    }
}
