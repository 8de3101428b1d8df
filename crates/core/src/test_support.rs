//! Fixtures shared by the unit tests in this crate.

use chrono::TimeZone;

use crate::distance::METERS_PER_DEGREE;
use crate::model::{PerformanceRecord, TransitStop};
use crate::types::{GeoPoint, Timestamp};

pub const VENUE: GeoPoint = GeoPoint {
    lat: 55.9533,
    lon: -3.1883,
};

pub fn at(hour: u32, minute: u32) -> Timestamp {
    chrono::Utc
        .with_ymd_and_hms(2025, 8, 10, hour, minute, 0)
        .single()
        .expect("valid fixture time")
}

/// Position `meters` due north of `origin` (exact along a meridian).
pub fn north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
    GeoPoint::new(origin.lat + meters / METERS_PER_DEGREE, origin.lon)
}

pub fn stop(id: &str, location: GeoPoint) -> TransitStop {
    TransitStop {
        stop_id: id.to_string(),
        name: format!("Stop {id}"),
        locality: "Old Town".to_string(),
        lat: location.lat,
        lon: location.lon,
        services: vec!["23".to_string(), "27".to_string()],
        buses_per_hour: None,
    }
}

pub fn record(event_id: &str, venue_id: &str, capacity: Option<u32>) -> PerformanceRecord {
    let mut r = PerformanceRecord::new(event_id, venue_id, at(19, 0));
    r.event_name = format!("Show {event_id}");
    r.venue_name = format!("Venue {venue_id}");
    r.venue_lat = Some(VENUE.lat);
    r.venue_lon = Some(VENUE.lon);
    r.venue_capacity = capacity;
    r
}
